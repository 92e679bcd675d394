use clap::Parser;
use dotenv::dotenv;
use fluxwire_core::{
    ActionCreator, DispatchError, DispatchMode, Dispatcher, DispatcherConfig, ErrorRecord, Store,
    StoreBinding, Wiring,
};
use log::{error, info, warn};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;

fn main() {
    dotenv().ok();
    env_logger::init();
    let args = TodoArgs::parse();
    if let Err(e) = _main(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Todo list driven through the fluxwire dispatcher
#[derive(clap::Parser)]
#[command(version, about, long_about = None)]
struct TodoArgs {
    /// Titles to add, in order
    titles: Vec<String>,

    /// Empty the list once every title has been added
    #[arg(long, short)]
    clear: bool,

    /// Override FLUXWIRE_DISPATCH_ASYNC for this run
    #[arg(long, short, value_enum)]
    mode: Option<ModeArg>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// dispatch on every enqueue
    Sync,
    /// batch enqueues until the end of the run
    Deferred,
}

impl From<ModeArg> for DispatchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sync => DispatchMode::Sync,
            ModeArg::Deferred => DispatchMode::Deferred,
        }
    }
}

/// Todo list state shared between the store listeners and the view
#[derive(Debug, Default)]
struct TodoState {
    items: Vec<String>,
    last_error: Option<String>,
}

fn todo_actions() -> ActionCreator {
    ActionCreator::new("Todo")
        .method("add", |ctx, args| {
            match args.first().and_then(Value::as_str) {
                Some(title) if !title.trim().is_empty() => ctx.dispatch(json!(title))?,
                _ => ctx.error(None, Some("a todo needs a title"), args.first().cloned())?,
            }
            Ok(Value::Null)
        })
        .method("clear", |ctx, _| {
            ctx.dispatch(None)?;
            Ok(Value::Null)
        })
}

fn todo_store(state: Rc<RefCell<TodoState>>) -> Store {
    let (on_add, on_clear, on_error) = (state.clone(), state.clone(), state);
    Store::new("TodoStore")
        .on("add", move |payload| {
            let title = payload
                .as_str()
                .ok_or_else(|| DispatchError::listener("todo payload is not a string"))?;
            on_add.borrow_mut().items.push(title.to_string());
            Ok(())
        })
        .on("clear", move |_| {
            on_clear.borrow_mut().items.clear();
            Ok(())
        })
        .on_error(move |payload| {
            let record = ErrorRecord::from_payload(payload)?;
            warn!("{} failed: {}", record.deferred_success_event, record.message);
            on_error.borrow_mut().last_error = Some(record.message);
            Ok(())
        })
}

/// Wire the todo app, then add every title as a todo
fn _main(args: &TodoArgs) -> Result<TodoState, DispatchError> {
    let state = Rc::new(RefCell::new(TodoState::default()));
    let store = todo_store(state.clone());

    let mut config = DispatcherConfig::from_env();
    if let Some(mode) = args.mode {
        config = config.with_mode(mode.into());
    }
    let dispatcher = Dispatcher::from_config(config);
    let wiring = Wiring::build(&dispatcher, vec![todo_actions()], [("todos", store.clone())])?;

    let mut view = {
        let state = state.clone();
        StoreBinding::new(move |_| {
            let state = state.borrow();
            info!("{} todo(s): {:?}", state.items.len(), state.items);
            Ok(())
        })
    };
    view.watch_store(&store);
    view.attach(&dispatcher)?;

    for title in &args.titles {
        wiring.call("add", &[json!(title)])?;
    }
    if args.clear {
        wiring.call("clear", &[])?;
    }
    if dispatcher.is_async() {
        dispatcher.dispatch()?;
    }
    view.detach()?;

    let summary = state.take();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> TodoArgs {
        TodoArgs::try_parse_from(std::iter::once("fluxwire").chain(values.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_main_adds_todos() {
        let state = _main(&args(&["write docs", "ship it"])).unwrap();
        assert_eq!(state.items, vec!["write docs", "ship it"]);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_main_with_clear() {
        let state = _main(&args(&["a", "b", "--clear"])).unwrap();
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_main_deferred_mode() {
        let state = _main(&args(&["--mode", "deferred", "a", "b"])).unwrap();
        assert_eq!(state.items, vec!["a", "b"]);
    }

    #[test]
    fn test_main_with_blank_title_reports_error() {
        let state = _main(&args(&["   "])).unwrap();
        assert!(state.items.is_empty());
        assert_eq!(state.last_error.as_deref(), Some("a todo needs a title"));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let parsed = TodoArgs::try_parse_from(["fluxwire", "--mode", "later"]);
        assert!(parsed.is_err());
    }
}
