use std::sync::{Arc, Mutex, MutexGuard};

use quicksearch_core::{update, Effect, Msg, NativeRequest, RequestId, SearchState, SearchViewModel};
use quicksearch_logging::{search_debug, search_error, search_info, search_warn};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::debounce::Debouncer;
use crate::page::PageDom;
use crate::presenter::Presenter;
use crate::submit::SearchTransport;
use crate::RuntimeEvent;

pub type SharedPage = Arc<Mutex<dyn PageDom>>;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: RuntimeEvent);
}

/// Forwards runtime events over a standard channel.
pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<RuntimeEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<RuntimeEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: RuntimeEvent) {
        let _ = self.tx.send(event);
    }
}

/// Discards runtime events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: RuntimeEvent) {}
}

enum Inbound {
    Msg(Msg),
    /// Answered once every earlier message has been handled.
    Flush(oneshot::Sender<()>),
}

/// Handle to a running search page. Dropping it stops the loop.
pub struct SearchHandle {
    msg_tx: mpsc::UnboundedSender<Inbound>,
    view_rx: watch::Receiver<SearchViewModel>,
    page: SharedPage,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SearchHandle {
    pub fn text_input(&self, field: impl Into<String>, value: impl Into<String>) {
        self.send(Msg::TextInput {
            field: field.into(),
            value: value.into(),
        });
    }

    pub fn checkbox_clicked(
        &self,
        field: impl Into<String>,
        value: impl Into<String>,
        checked: bool,
    ) {
        self.send(Msg::CheckboxClicked {
            field: field.into(),
            value: value.into(),
            checked,
        });
    }

    pub fn send(&self, msg: Msg) {
        if self.msg_tx.send(Inbound::Msg(msg)).is_err() {
            search_warn!("search runtime is no longer running; message dropped");
        }
    }

    /// Waits until every message sent so far has gone through `update` and
    /// its effects have been started. Returns `false` if the loop has stopped.
    pub async fn flush(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        if self.msg_tx.send(Inbound::Flush(tx)).is_err() {
            return false;
        }
        rx.await.is_ok()
    }

    /// Latest published view of the search state.
    pub fn view(&self) -> SearchViewModel {
        self.view_rx.borrow().clone()
    }

    /// Current markup of the whole page.
    pub fn page_markup(&self) -> String {
        lock_page(&self.page).to_html()
    }

    /// Subscribes to view updates.
    pub fn watch_view(&self) -> watch::Receiver<SearchViewModel> {
        self.view_rx.clone()
    }

    /// Stops the loop and waits for it. In-flight requests are left to finish
    /// on their own; their results are discarded.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                search_error!("search runtime task failed: {}", err);
            }
        }
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

pub struct SearchRuntime;

impl SearchRuntime {
    /// Starts the runtime loop on the current tokio runtime.
    pub fn spawn(
        state: SearchState,
        page: SharedPage,
        transport: Arc<dyn SearchTransport>,
        sink: Arc<dyn EventSink>,
    ) -> SearchHandle {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(state.view());
        let shutdown = CancellationToken::new();

        let executor = EffectExecutor {
            presenter: Presenter::from_profile(state.profile()),
            debouncer: Debouncer::new(state.profile().quiet_period),
            page: page.clone(),
            transport,
            sink,
            msg_tx: msg_tx.clone(),
        };
        let task = tokio::spawn(run_loop(
            state,
            executor,
            msg_rx,
            view_tx,
            shutdown.clone(),
        ));

        SearchHandle {
            msg_tx,
            view_rx,
            page,
            shutdown,
            task: Some(task),
        }
    }
}

async fn run_loop(
    mut state: SearchState,
    mut executor: EffectExecutor,
    mut msg_rx: mpsc::UnboundedReceiver<Inbound>,
    view_tx: watch::Sender<SearchViewModel>,
    shutdown: CancellationToken,
) {
    search_info!("search runtime started for profile {}", state.profile().name);
    loop {
        let inbound = tokio::select! {
            _ = shutdown.cancelled() => break,
            inbound = msg_rx.recv() => match inbound {
                Some(inbound) => inbound,
                None => break,
            },
        };
        let msg = match inbound {
            Inbound::Msg(msg) => msg,
            Inbound::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };
        search_debug!("dispatch {:?}", msg);

        let (next, effects) = update(state, msg);
        state = next;
        for effect in effects {
            executor.execute(effect);
        }
        if state.consume_dirty() {
            view_tx.send_replace(state.view());
        }
    }
    executor.debouncer.cancel();
    search_info!("search runtime stopped");
}

struct EffectExecutor {
    presenter: Presenter,
    debouncer: Debouncer,
    page: SharedPage,
    transport: Arc<dyn SearchTransport>,
    sink: Arc<dyn EventSink>,
    msg_tx: mpsc::UnboundedSender<Inbound>,
}

impl EffectExecutor {
    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::ScheduleSubmit { ticket, delay } => {
                search_debug!("submit {:?} scheduled in {:?}", ticket, delay);
                let tx = self.msg_tx.clone();
                self.debouncer.schedule(async move {
                    let _ = tx.send(Inbound::Msg(Msg::QuietPeriodElapsed(ticket)));
                });
                self.sink.emit(RuntimeEvent::Scheduled { ticket });
            }
            Effect::CancelSubmit => {
                self.debouncer.cancel();
            }
            Effect::ClearErrors => self.presenter.clear_errors(&mut *lock_page(&self.page)),
            Effect::ShowLoading => self.presenter.show_loading(&mut *lock_page(&self.page)),
            Effect::HideLoading => self.presenter.hide_loading(&mut *lock_page(&self.page)),
            Effect::ApplyFragment { request_id, markup } => {
                let status_updated = self
                    .presenter
                    .apply_fragment(&mut *lock_page(&self.page), &markup);
                self.sink.emit(RuntimeEvent::FragmentApplied {
                    request_id,
                    status_updated,
                });
            }
            Effect::Post {
                request_id,
                endpoint,
                body,
            } => self.spawn_post(request_id, endpoint, body),
            Effect::NativeSubmit { form } => self.spawn_navigation(form.native_request()),
        }
    }

    /// The request is detached: a newer submission never aborts it.
    fn spawn_post(&self, request_id: RequestId, endpoint: String, body: String) {
        search_info!("POST {} request_id={} body_len={}", endpoint, request_id, body.len());
        self.sink.emit(RuntimeEvent::Posted {
            request_id,
            endpoint: endpoint.clone(),
        });

        let transport = self.transport.clone();
        let sink = self.sink.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let msg = match transport.post_fragment(&endpoint, &body).await {
                Ok(output) => Msg::SubmissionSucceeded {
                    request_id,
                    markup: output.markup,
                },
                Err(err) => {
                    search_warn!(
                        "request {} to {} failed, falling back to full submission: {}",
                        request_id,
                        endpoint,
                        err
                    );
                    sink.emit(RuntimeEvent::FellBack {
                        request_id,
                        kind: err.kind.clone(),
                    });
                    Msg::SubmissionFailed {
                        request_id,
                        reason: err.to_string(),
                    }
                }
            };
            let _ = tx.send(Inbound::Msg(msg));
        });
    }

    fn spawn_navigation(&mut self, request: NativeRequest) {
        self.debouncer.cancel();
        search_info!("native {:?} submission to {}", request.method, request.url);

        let transport = self.transport.clone();
        let sink = self.sink.clone();
        let page = self.page.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            match transport.navigate(&request).await {
                Ok(output) => {
                    lock_page(&page).replace_document(&output.markup);
                    sink.emit(RuntimeEvent::Navigated {
                        url: output.final_url,
                    });
                    let _ = tx.send(Inbound::Msg(Msg::PageReloaded));
                }
                Err(err) => {
                    search_error!("native submission to {} failed: {}", request.url, err);
                    let reason = err.to_string();
                    sink.emit(RuntimeEvent::NavigationFailed {
                        url: request.url,
                        kind: err.kind,
                    });
                    let _ = tx.send(Inbound::Msg(Msg::NavigationFailed { reason }));
                }
            }
        });
    }
}

fn lock_page(page: &SharedPage) -> MutexGuard<'_, dyn PageDom + 'static> {
    match page.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
