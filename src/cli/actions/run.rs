use super::{register, request, session, Action};
use anyhow::Result;

pub(super) async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Register(args) => register::handle(args).await,
        Action::Request(args) => request::handle(args).await,
        Action::Session(args) => session::handle(args),
    }
}
