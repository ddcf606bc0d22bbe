//! Authentication gate.

/// Asked by `Action::AuthenticationGate` whether a deep link may continue.
///
/// When the user is not authenticated the gate calls [`Authenticator::request_authentication`]
/// and pauses the batch. The host resumes it through `Navigator::resume` once sign-in
/// succeeds, or drops it with `Navigator::cancel_resume`.
pub trait Authenticator: Send + Sync {
    fn is_authenticated(&self) -> bool;

    fn request_authentication(&self);
}
