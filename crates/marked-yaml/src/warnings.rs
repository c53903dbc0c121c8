//! Non-fatal reporting: warnings and deprecation notices.
//!
//! Construction never stops for these; they go to a [`WarningSink`] supplied
//! by the host. The default sink forwards to `tracing`.

use marked_origin::Origin;

/// Receiver for non-fatal notices emitted during construction.
pub trait WarningSink {
    /// An ordinary warning, e.g. a duplicate mapping key under the `Warn`
    /// policy.
    fn warning(&self, message: &str, origin: Option<&Origin>);

    /// A deprecation notice. `version` names the release the deprecated
    /// behavior is scheduled to disappear in, when known.
    fn deprecation(
        &self,
        message: &str,
        version: Option<&str>,
        origin: Option<&Origin>,
        help_text: Option<&str>,
    );
}

impl<S: WarningSink + ?Sized> WarningSink for std::rc::Rc<S> {
    fn warning(&self, message: &str, origin: Option<&Origin>) {
        (**self).warning(message, origin);
    }

    fn deprecation(
        &self,
        message: &str,
        version: Option<&str>,
        origin: Option<&Origin>,
        help_text: Option<&str>,
    ) {
        (**self).deprecation(message, version, origin, help_text);
    }
}

/// Default sink: forwards everything to `tracing` at WARN level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warning(&self, message: &str, origin: Option<&Origin>) {
        match origin {
            Some(origin) => tracing::warn!(%origin, "{message}"),
            None => tracing::warn!("{message}"),
        }
    }

    fn deprecation(
        &self,
        message: &str,
        version: Option<&str>,
        origin: Option<&Origin>,
        help_text: Option<&str>,
    ) {
        tracing::warn!(
            origin = ?origin,
            version = ?version,
            help = ?help_text,
            "deprecation: {message}"
        );
    }
}

/// A sink that records everything it receives. Hosts use it to surface
/// notices through their own reporting channel; the test suites use it for
/// assertions.
pub mod recording {
    use super::*;
    use std::cell::RefCell;

    /// See the module docs.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub warnings: RefCell<Vec<String>>,
        pub deprecations: RefCell<Vec<String>>,
    }

    impl WarningSink for RecordingSink {
        fn warning(&self, message: &str, _origin: Option<&Origin>) {
            self.warnings.borrow_mut().push(message.to_string());
        }

        fn deprecation(
            &self,
            message: &str,
            _version: Option<&str>,
            _origin: Option<&Origin>,
            _help_text: Option<&str>,
        ) {
            self.deprecations.borrow_mut().push(message.to_string());
        }
    }
}
