//! Server-side state of the page's modal and toast.

mod modal;
mod toast;

pub use modal::{Modal, ModalPhase};
pub use toast::Toast;

#[cfg(test)]
pub(crate) use modal::MODAL_CLOSE_DELAY;
