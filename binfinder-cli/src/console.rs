//! Console command parsing and plain-text reply rendering.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use binfinder_core::{Coordinate, ImageSource, InboundEvent, Prompt, Reply, UserId};

pub(crate) const USAGE: &str = "Commands:\n  \
    photo <path>       classify a photo\n  \
    mode <id>          pick smarttrash, bulkytrash or wasteyard\n  \
    loc <lat> <lon>    share a location\n  \
    lang <code>        switch reply language\n  \
    user <id>          switch conversation\n  \
    quit               exit\n\
    Anything else is sent as a message.";

/// One line typed at the console.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Empty,
    Quit,
    Language(String),
    User(String),
    Photo(PathBuf),
    Mode(String),
    Location(Coordinate),
    Text(String),
}

pub(crate) fn parse(line: &str) -> Result<Command> {
    let line = line.trim();
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(head, rest)| (head, rest.trim()));

    let command = match head {
        "" => Command::Empty,
        "quit" | "exit" => Command::Quit,
        "lang" => Command::Language(argument(rest, "lang <code>")?),
        "user" => Command::User(argument(rest, "user <id>")?),
        "photo" => Command::Photo(PathBuf::from(argument(rest, "photo <path>")?)),
        "mode" => Command::Mode(argument(rest, "mode <id>")?),
        "loc" => Command::Location(location(rest)?),
        _ => Command::Text(line.to_owned()),
    };
    Ok(command)
}

fn argument(rest: &str, usage: &str) -> Result<String> {
    if rest.is_empty() {
        bail!("usage: {usage}");
    }
    Ok(rest.to_owned())
}

fn location(rest: &str) -> Result<Coordinate> {
    let mut parts = rest
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|part| !part.is_empty());
    let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
        bail!("usage: loc <lat> <lon>");
    };
    let lat: f64 = lat.parse().with_context(|| format!("bad latitude {lat:?}"))?;
    let lon: f64 = lon.parse().with_context(|| format!("bad longitude {lon:?}"))?;
    Ok(Coordinate::new(lat, lon)?)
}

impl Command {
    /// Event for the router, or `None` for commands handled by the console itself.
    pub(crate) fn into_event(self, user_id: &UserId, language_code: &str) -> Option<InboundEvent> {
        let user_id = user_id.clone();
        let language_code = language_code.to_owned();
        let event = match self {
            Command::Photo(path) => InboundEvent::Photo {
                user_id,
                image: ImageSource::Path(path),
                language_code,
            },
            Command::Mode(mode) => InboundEvent::ModeSelection {
                user_id,
                mode,
                language_code,
            },
            Command::Location(coordinate) => InboundEvent::Location {
                user_id,
                coordinate,
                language_code,
            },
            Command::Text(text) => InboundEvent::Text {
                user_id,
                text,
                language_code,
            },
            Command::Empty | Command::Quit | Command::Language(_) | Command::User(_) => {
                return None;
            }
        };
        Some(event)
    }
}

/// Reply text followed by hints for answering its prompt.
pub(crate) fn render(reply: &Reply) -> String {
    let mut out = reply.text.clone();
    match &reply.prompt {
        Some(Prompt::ShareLocation { label }) => {
            out.push_str(&format!("\n  [{label}] -> loc <lat> <lon>"));
        }
        Some(Prompt::Choices(choices)) => {
            for choice in choices {
                out.push_str(&format!("\n  [{}] -> mode {}", choice.label, choice.callback_id));
            }
        }
        None => {}
    }
    out.push('\n');
    out
}
