#[macro_export]
macro_rules! notify_err {
    // Case with just a message
    ($kind:expr, $msg:expr) => {
        $crate::errors::NotifyError {
            kind: $kind,
            message: $msg.into(),
            file: file!(),
            line: line!(),
        }
    };
    // Case with message + format arguments
    ($kind:expr, $fmt:expr, $($args:tt)*) => {
        $crate::errors::NotifyError {
            kind: $kind,
            message: format!($fmt, $($args)*),
            file: file!(),
            line: line!(),
        }
    };
}

#[derive(Debug)]
pub struct NotifyError {
    pub kind: NotifyErrorKind,
    pub message: String,
    pub file: &'static str,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyErrorKind {
    /// The bus was unreachable or rejected a method call.
    Transport,
    /// A reply or signal body did not match the shape the protocol
    /// promises. A protocol violation on the server side, not a local bug.
    Decode,
    InvalidArgument,

    Subscription,
    Unsubscribe,
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}: {} ({}:{})",
            self.kind, self.message, self.file, self.line
        )
    }
}

impl std::error::Error for NotifyError {}
