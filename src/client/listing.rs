use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use futures::{stream::BoxStream, Stream};

use crate::domain::{
    errors::{ClientError, ClientResult},
    models::ObjectInfo,
};

/// Lazy, single-pass listing of the objects under a prefix.
///
/// Each item is either the metadata of one object or the error that occurred
/// while producing it; an item error does not end the listing. When the
/// request context is cancelled or expires, one final `Cancelled` or
/// `DeadlineExceeded` item is yielded and the listing ends.
pub struct ObjectListing<'a> {
    inner: BoxStream<'a, ClientResult<ObjectInfo>>,
    interrupted: Pin<Box<dyn Future<Output = ClientError> + Send + 'a>>,
    finished: bool,
}

impl<'a> ObjectListing<'a> {
    pub(crate) fn new(
        inner: BoxStream<'a, ClientResult<ObjectInfo>>,
        interrupted: impl Future<Output = ClientError> + Send + 'a,
    ) -> Self {
        Self {
            inner,
            interrupted: Box::pin(interrupted),
            finished: false,
        }
    }
}

impl Stream for ObjectListing<'_> {
    type Item = ClientResult<ObjectInfo>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        if let Poll::Ready(err) = self.interrupted.as_mut().poll(cx) {
            self.finished = true;
            return Poll::Ready(Some(Err(err)));
        }

        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for ObjectListing<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectListing")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
