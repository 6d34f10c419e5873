//! Message role: log events reported by fzf bindings.

use crate::{debug, log};

/// Event names sent by the verbose bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FzfEvent<'a> {
    Reload,
    Load,
    Zero,
    Unknown(&'a str),
}

impl<'a> FzfEvent<'a> {
    pub fn parse(message: &'a str) -> Self {
        match message {
            "RELOAD" => Self::Reload,
            "LOAD" => Self::Load,
            "ZERO" => Self::Zero,
            other => Self::Unknown(other),
        }
    }
}

pub fn run(message: &str) -> i32 {
    match FzfEvent::parse(message) {
        FzfEvent::Reload => log!("reload"; "manual reload"),
        FzfEvent::Load => debug!("fzf"; "loading complete"),
        FzfEvent::Zero => log!("warn"; "reload produced no output"),
        FzfEvent::Unknown(other) => log!("warn"; "unknown fzf event: {other}"),
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events() {
        assert_eq!(FzfEvent::parse("RELOAD"), FzfEvent::Reload);
        assert_eq!(FzfEvent::parse("LOAD"), FzfEvent::Load);
        assert_eq!(FzfEvent::parse("ZERO"), FzfEvent::Zero);
        assert_eq!(FzfEvent::parse("load"), FzfEvent::Unknown("load"));
    }
}
