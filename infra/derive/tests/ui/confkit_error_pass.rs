use confkit_derive::confkit_error;
use std::borrow::Cow;
use std::sync::Arc;

#[confkit_error]
pub enum DemoError {
    #[error("Rejected '{parameter}'{}: {message}", format_context(.context))]
    Rejected { parameter: Arc<str>, message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let err = DemoError::Rejected { parameter: Arc::from("port"), message: "too big".into(), context: None };
    assert_eq!(err.kind(), "Rejected");
    assert_eq!(err.parameter(), Some("port"));

    let internal: DemoError = "boom".into();
    assert_eq!(internal.kind(), "Internal");
    assert_eq!(internal.parameter(), None);

    let io: Result<(), DemoError> =
        Err(std::io::Error::other("disk")).context("Reading settings");
    assert!(io.unwrap_err().to_string().contains("(Reading settings)"));
}
