//! Quicksearch engine: transport, page model and effect execution.
mod debounce;
mod decode;
mod fragment;
mod page;
mod presenter;
mod runtime;
mod submit;
mod types;

pub use debounce::Debouncer;
pub use decode::{decode_body, DecodeError, DecodedBody};
pub use fragment::find_marked_inner_html;
pub use page::{MemoryPage, PageDom};
pub use presenter::Presenter;
pub use runtime::{
    ChannelEventSink, EventSink, NullEventSink, SearchHandle, SearchRuntime, SharedPage,
};
pub use submit::{ReqwestTransport, SearchTransport, TransportSettings};
pub use types::{FailureKind, RuntimeEvent, SubmitError, TransportOutput};
