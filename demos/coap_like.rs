//! A CoAP-flavoured walk through a rendezvous point.
//!
//! Three exchanges:
//! 1. a resource answers with a single final response;
//! 2. an observation streams notifications until the client walks away, which
//!    cancels the bound producer;
//! 3. a resource fails with a renderable error that becomes a 4.04 response.
//!
//! Run with `RUST_LOG=debug cargo run --example coap_like`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use rendezvous::{
    BindConfig, Binder, ErrorResponse, Event, Interest, ProduceError, ProducerFn, RenderError,
    RenderableError, Rendezvous,
};

#[derive(Debug, Clone, PartialEq)]
struct Message {
    code: &'static str,
    payload: String,
}

impl Message {
    fn content(payload: impl Into<String>) -> Self {
        Self {
            code: "2.05 Content",
            payload: payload.into(),
        }
    }
}

impl ErrorResponse for Message {
    fn internal_error() -> Self {
        Self {
            code: "5.00 Internal Server Error",
            payload: String::new(),
        }
    }

    fn timeout() -> Self {
        Self {
            code: "5.04 Gateway Timeout",
            payload: String::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("no resource at {0}")]
struct NotFound(String);

impl RenderableError<Message> for NotFound {
    fn to_response(&self) -> Result<Option<Message>, RenderError> {
        Ok(Some(Message {
            code: "4.04 Not Found",
            payload: self.to_string(),
        }))
    }
}

type Exchange = Rendezvous<String, Message, std::io::Error>;
type Notification = Event<Message, std::io::Error>;

fn print_event(tag: &'static str) -> impl FnMut(&Notification) -> bool + Send + 'static {
    move |ev| {
        match (&ev.response, &ev.error) {
            (Some(m), _) => println!("[{tag}] {} {:?} (last: {})", m.code, m.payload, ev.is_last),
            (None, Some(e)) => println!("[{tag}] error: {e}"),
            (None, None) => println!("[{tag}] nobody is producing anymore"),
        }
        !ev.is_last
    }
}

async fn single_response(binder: &Binder) -> anyhow::Result<()> {
    let point: Exchange = Rendezvous::with_tracing("GET /hello".to_string());
    point.register(print_event("hello"), Interest::Active)?;

    let responder = point.clone();
    let task = binder.bind(
        &point,
        ProducerFn::new("hello", move |_ctx| async move {
            responder.push_response(Message::content("Hello world"), true);
            Ok::<(), ProduceError<Message>>(())
        }),
    );

    let outcome = task.join().await;
    println!("[hello] producer outcome: {}", outcome.as_label());
    Ok(())
}

async fn observation(binder: &Binder) -> anyhow::Result<()> {
    let point: Exchange = Rendezvous::with_tracing("GET /time (observe)".to_string());
    let seen = Arc::new(Notify::new());

    let mut remaining = 3;
    let wake = Arc::clone(&seen);
    let mut print = print_event("time");
    let handle = point.register(
        move |ev: &Notification| {
            let keep = print(ev);
            remaining -= 1;
            if remaining == 0 {
                wake.notify_one();
            }
            keep
        },
        Interest::Active,
    )?;
    point.register(print_event("audit"), Interest::Passive)?;

    let responder = point.clone();
    let task = binder.bind(
        &point,
        ProducerFn::new("clock", move |ctx: CancellationToken| async move {
            let mut tick = 0u32;
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_millis(50)) => {}
                }
                tick += 1;
                responder.push_response(Message::content(format!("tick {tick}")), false);
            }
            Err::<(), _>(ProduceError::<Message>::Canceled)
        }),
    );

    seen.notified().await;
    println!("[time] client loses interest");
    handle.unregister();

    let outcome = task.join().await;
    println!("[time] producer outcome: {}", outcome.as_label());
    Ok(())
}

async fn missing_resource(binder: &Binder) -> anyhow::Result<()> {
    let point: Exchange = Rendezvous::with_tracing("GET /nope".to_string());
    point.register(print_event("nope"), Interest::Active)?;

    let path = point.request().clone();
    let task = binder.bind(
        &point,
        ProducerFn::new("lookup", move |_ctx| async move {
            Err::<(), _>(ProduceError::<Message>::render(NotFound(path)))
        }),
    );

    let outcome = task.join().await;
    println!("[nope] producer outcome: {}", outcome.as_label());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let binder = Binder::new(BindConfig::default().with_timeout(Duration::from_secs(2)));

    single_response(&binder).await.context("single response")?;
    observation(&binder).await.context("observation")?;
    missing_resource(&binder).await.context("missing resource")?;
    Ok(())
}
