use std::fmt;
use std::sync::Arc;

use http::Request;

use crate::convert::ResponseConverter;
use crate::transport::Transport;
use crate::Call;

/// Creates [`Call`]s that share one transport and one converter.
///
/// This is where the collaborators are configured once, and then each
/// finalized request becomes a new, independent call.
pub struct CallFactory<T, B = ()> {
    transport: Arc<dyn Transport<B>>,
    converter: Arc<dyn ResponseConverter<T>>,
}

impl<T, B> CallFactory<T, B> {
    /// Create a factory from a transport and a converter.
    pub fn new(
        transport: Arc<dyn Transport<B>>,
        converter: Arc<dyn ResponseConverter<T>>,
    ) -> Self {
        CallFactory {
            transport,
            converter,
        }
    }

    /// Make a new call for `request`.
    pub fn new_call(&self, request: Request<B>) -> Call<T, B> {
        Call::new(request, self.transport.clone(), self.converter.clone())
    }
}

impl<T, B> Clone for CallFactory<T, B> {
    fn clone(&self) -> Self {
        CallFactory {
            transport: self.transport.clone(),
            converter: self.converter.clone(),
        }
    }
}

impl<T, B> fmt::Debug for CallFactory<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallFactory").finish_non_exhaustive()
    }
}
