//! Disposable trait - ordered resource teardown
//!
//! The shutdown coordinator walks a list of these in reverse-acquisition
//! order once the job completes. Disposal is boxed-future based so the
//! list can hold heterogeneous resources behind `dyn Disposable`.

use std::future::Future;
use std::pin::Pin;

use crate::BatchError;

/// Future returned by [`Disposable::dispose`]
pub type DisposeFuture<'a> = Pin<Box<dyn Future<Output = Result<(), BatchError>> + Send + 'a>>;

/// A resource released during shutdown
pub trait Disposable: Send {
    /// Resource name (used for logging)
    fn name(&self) -> &str;

    /// Release the resource
    ///
    /// A disposal error is logged by the coordinator and never blocks the
    /// disposal of remaining resources.
    fn dispose(&mut self) -> DisposeFuture<'_>;
}
