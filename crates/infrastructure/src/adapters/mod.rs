//! Handler adapters.

mod recorder;
mod reqwest_handler;

pub use recorder::{Recorder, RecorderHandler, RecorderResponse};
pub use reqwest_handler::{HttpResponse, ReqwestHandler};
