use kvo_derive::kvo_error;
use std::borrow::Cow;

#[kvo_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<std::borrow::Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read() -> Result<(), DemoError> {
    Err::<(), _>(std::io::Error::other("disk gone")).context("Reading fixture")?;
    Ok(())
}

fn main() {
    let err = read().expect_err("io error expected");
    assert_eq!(err.to_string(), "IO error (Reading fixture): disk gone");

    let err: DemoError = "broken".into();
    let err = Err::<(), _>(err).context("startup").expect_err("internal expected");
    assert_eq!(err.to_string(), "Internal error (startup): broken");
}
