/// Read a fluxwire setting from the environment, falling back to the
/// default in `fluxwire_core::config`.
#[macro_export]
macro_rules! get_fluxwire_setting {
    ($setting:ident) => {
        ::std::env::var(stringify!($setting))
            .unwrap_or($crate::config::$setting.to_string())
    };
    ($setting:ident, bool) => {
        match ::std::env::var(stringify!($setting)) {
            Ok(v) => match v.trim().to_lowercase().parse::<bool>() {
                Ok(b) => b,
                Err(_e) => {
                    ::log::warn!(
                        "Env var setting {}, is not a valid boolean. Using default",
                        stringify!($setting)
                    );
                    $crate::config::$setting
                }
            },
            Err(_e) => $crate::config::$setting,
        }
    };
}
