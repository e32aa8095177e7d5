//! Conversation state machine turning inbound events into localized replies.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::category::{BinColor, ClassificationResult};
use crate::config::{RouterSettings, SearchPlan};
use crate::geo::{RankedFacility, directions_link};
use crate::localizer::ResponseLocalizer;
use crate::model::{Coordinate, FacilityKind, FacilityQuery, UserId, attr};
use crate::ports::{ChatPort, ChatRole, Classifier, ImageSource, PortError};
use crate::service::FacilityService;
use crate::state::{ConversationState, SessionStore};

const HELP_KEYWORDS: [&str; 3] = ["help", "info", "what can you do"];

const HELP_TEXT: &str = "I help you dispose of waste correctly.\n\
    Send me a photo of an item and I will tell you which bin it belongs in. \
    Then share your location and I will find the nearest monitored bin.\n\
    You can also pick a facility type below and share your location.";

/// Event received from the messaging layer.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// The user sent a photo of an item.
    Photo {
        /// Sender.
        user_id: UserId,
        /// The photo.
        image: ImageSource,
        /// Sender's language.
        language_code: String,
    },
    /// The user picked a facility type (`smarttrash`, `bulkytrash`, `wasteyard`).
    ModeSelection {
        /// Sender.
        user_id: UserId,
        /// Raw mode identifier.
        mode: String,
        /// Sender's language.
        language_code: String,
    },
    /// The user shared a location.
    Location {
        /// Sender.
        user_id: UserId,
        /// Shared position.
        coordinate: Coordinate,
        /// Sender's language.
        language_code: String,
    },
    /// The user wrote free text.
    Text {
        /// Sender.
        user_id: UserId,
        /// Message text.
        text: String,
        /// Sender's language.
        language_code: String,
    },
}

impl InboundEvent {
    /// Sender of the event.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        match self {
            InboundEvent::Photo { user_id, .. }
            | InboundEvent::ModeSelection { user_id, .. }
            | InboundEvent::Location { user_id, .. }
            | InboundEvent::Text { user_id, .. } => user_id,
        }
    }

    /// Language the sender uses.
    #[must_use]
    pub fn language_code(&self) -> &str {
        match self {
            InboundEvent::Photo { language_code, .. }
            | InboundEvent::ModeSelection { language_code, .. }
            | InboundEvent::Location { language_code, .. }
            | InboundEvent::Text { language_code, .. } => language_code,
        }
    }
}

/// Button offered alongside a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    /// Button text.
    pub label: String,
    /// Identifier sent back when the button is pressed.
    pub callback_id: String,
}

/// Kind of input the reply asks for next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Prompt {
    /// Ask the user to share their location.
    ShareLocation {
        /// Button text.
        label: String,
    },
    /// Offer a set of choices.
    Choices(Vec<Choice>),
}

impl Prompt {
    fn share_location() -> Self {
        Prompt::ShareLocation {
            label: "Share my location".to_owned(),
        }
    }

    fn facility_kinds() -> Self {
        Prompt::Choices(
            FacilityKind::ALL
                .into_iter()
                .map(|kind| Choice {
                    label: match kind {
                        FacilityKind::SmartBin => "Smart bins",
                        FacilityKind::BulkyWaste => "Bulky waste",
                        FacilityKind::CollectionYard => "Collection yards",
                    }
                    .to_owned(),
                    callback_id: kind.mode_id().to_owned(),
                })
                .collect(),
        )
    }
}

/// Semantic reply to a single inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    /// Localized text.
    pub text: String,
    /// Whether `text` uses Markdown.
    pub markdown: bool,
    /// Optional follow-up prompt.
    pub prompt: Option<Prompt>,
}

impl Reply {
    fn plain<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            markdown: false,
            prompt: None,
        }
    }

    fn markdown<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            markdown: true,
            prompt: None,
        }
    }

    fn with_prompt(mut self, prompt: Prompt) -> Self {
        self.prompt = Some(prompt);
        self
    }
}

/// Routes inbound events through per-user conversation state to facility lookups.
pub struct ConversationRouter {
    service: Arc<FacilityService>,
    classifier: Arc<dyn Classifier>,
    chat: Option<Arc<dyn ChatPort>>,
    localizer: ResponseLocalizer,
    sessions: SessionStore,
    settings: RouterSettings,
}

impl ConversationRouter {
    /// Create a router without a free-chat collaborator.
    #[must_use]
    pub fn new(
        service: Arc<FacilityService>,
        classifier: Arc<dyn Classifier>,
        localizer: ResponseLocalizer,
        settings: RouterSettings,
    ) -> Self {
        Self {
            service,
            classifier,
            chat: None,
            localizer,
            sessions: SessionStore::new(),
            settings,
        }
    }

    /// Answer free text that is not a help request with `chat`.
    #[must_use]
    pub fn with_chat(mut self, chat: Arc<dyn ChatPort>) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Copy of a user's conversation state, if the user has been seen.
    pub async fn state(&self, user: &UserId) -> Option<ConversationState> {
        self.sessions.snapshot(user).await
    }

    /// Forget conversations idle for longer than the configured session lifetime.
    ///
    /// Returns the number of evicted users.
    pub fn evict_idle_sessions(&self) -> usize {
        let evicted = self.sessions.evict_idle(self.settings.session_idle());
        if evicted > 0 {
            info!(evicted, "evicted idle conversations");
        }
        evicted
    }

    /// Process one event and produce the localized reply.
    ///
    /// Events of one user are handled one at a time; different users run concurrently.
    /// Collaborator failures are turned into replies and never surface as errors.
    pub async fn handle(&self, event: InboundEvent) -> Reply {
        let mut state = self.sessions.lock(event.user_id()).await;
        state.language_code = event.language_code().to_owned();

        let draft = match event {
            InboundEvent::Photo { user_id, image, .. } => {
                self.on_photo(&mut state, &user_id, &image).await
            }
            InboundEvent::ModeSelection { user_id, mode, .. } => {
                Self::on_mode_selection(&mut state, &user_id, &mode)
            }
            InboundEvent::Location {
                user_id,
                coordinate,
                ..
            } => self.on_location(&mut state, &user_id, coordinate).await,
            InboundEvent::Text { user_id, text, .. } => {
                self.on_text(&mut state, &user_id, &text).await
            }
        };

        self.render(draft, &state.language_code).await
    }

    async fn on_photo(
        &self,
        state: &mut ConversationState,
        user: &UserId,
        image: &ImageSource,
    ) -> Reply {
        let label = match self.classifier.classify(image).await {
            Ok(label) => label,
            Err(err) => {
                warn!(%user, error = %err, "classification failed");
                state.reset();
                return Reply::plain(
                    "Sorry, I could not recognise the item. Please try another photo.",
                );
            }
        };

        let result = ClassificationResult::from_label(&label);
        info!(%user, label = %result.label, category = %result.category, "photo classified");

        let verdict = match result.bin_color {
            BinColor::Dropoff => "It does not belong in a street bin: take it to a collection \
                yard or a take-back point."
                .to_owned(),
            BinColor::Unknown => "I am not sure which bin it belongs in.".to_owned(),
            color => format!("It belongs in the *{color}* bin."),
        };
        let follow_up = if result.bin_color == BinColor::Dropoff {
            "You can still share your location to see the nearest monitored bins for the rest \
             of your waste, or type *help* to search collection yards."
        } else {
            "Share your location and I will find the nearest monitored bin."
        };
        let text = format!(
            "This looks like *{}* ({}). {verdict}\n{follow_up}",
            result.label, result.category
        );

        state.pending_classification = Some(result);
        Reply::markdown(text).with_prompt(Prompt::share_location())
    }

    fn on_mode_selection(state: &mut ConversationState, user: &UserId, mode: &str) -> Reply {
        match mode.parse::<FacilityKind>() {
            Ok(kind) => {
                info!(%user, mode = %kind, "facility mode selected");
                state.mode = Some(kind);
                Reply::plain(format!(
                    "Share your location and I will find the nearest {}.",
                    kind.label()
                ))
                .with_prompt(Prompt::share_location())
            }
            Err(err) => {
                warn!(%user, error = %err, "ignoring unknown mode");
                Reply::plain("Unknown option. Please pick one of the choices below.")
                    .with_prompt(Prompt::facility_kinds())
            }
        }
    }

    async fn on_location(
        &self,
        state: &mut ConversationState,
        user: &UserId,
        origin: Coordinate,
    ) -> Reply {
        // A pending classification is consumed first; a mode set alongside it
        // stays for the next location.
        let (plan, classification) = if let Some(result) = state.pending_classification.take() {
            (self.settings.classification_plan(), Some(result))
        } else if let Some(kind) = state.mode.take() {
            (self.settings.mode_plan(kind), None)
        } else {
            (self.settings.idle_plan(), None)
        };
        info!(%user, kind = %plan.kind, radius_m = plan.radius_meters, "resolving location");

        let outcome = match FacilityQuery::new(
            origin,
            plan.radius_meters,
            plan.limit,
            plan.only_monitored,
        ) {
            Ok(query) => self.service.nearest(plan.kind, &query, plan.top_n).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(ranked) if ranked.is_empty() => {
                info!(%user, kind = %plan.kind, "nothing found");
                Reply::plain(format!(
                    "No {} found within {} m. Try moving a bit or pick a wider search below.",
                    plan.kind.label(),
                    plan.radius_meters
                ))
                .with_prompt(Prompt::facility_kinds())
            }
            Ok(ranked) => Reply::markdown(format_found(
                origin,
                &plan,
                &ranked,
                classification.as_ref(),
            )),
            Err(err) => {
                warn!(%user, kind = %plan.kind, error = %err, "facility lookup failed");
                state.reset();
                Reply::plain(failure_text(plan.kind, &err))
            }
        }
    }

    async fn on_text(&self, state: &mut ConversationState, user: &UserId, text: &str) -> Reply {
        let normalized = text.trim().to_lowercase();
        if normalized.starts_with("/start") {
            return Reply::plain(format!("Hi! {HELP_TEXT}")).with_prompt(Prompt::facility_kinds());
        }
        if is_help_request(&normalized) {
            return Reply::plain(HELP_TEXT).with_prompt(Prompt::facility_kinds());
        }

        let Some(chat) = &self.chat else {
            return Reply::plain(HELP_TEXT).with_prompt(Prompt::facility_kinds());
        };

        match chat.complete(text, &state.history).await {
            Ok(answer) => {
                let limit = self.settings.history_limit;
                state.remember(ChatRole::User, text.to_owned(), limit);
                state.remember(ChatRole::Assistant, answer.clone(), limit);
                Reply::plain(answer)
            }
            Err(err) => {
                warn!(%user, error = %err, "chat completion failed");
                Reply::plain(HELP_TEXT).with_prompt(Prompt::facility_kinds())
            }
        }
    }

    async fn render(&self, draft: Reply, language: &str) -> Reply {
        let text = self.localizer.localize(&draft.text, language).await;
        let prompt = match draft.prompt {
            Some(Prompt::ShareLocation { label }) => Some(Prompt::ShareLocation {
                label: self.localizer.localize(&label, language).await,
            }),
            Some(Prompt::Choices(choices)) => {
                let mut localized = Vec::with_capacity(choices.len());
                for choice in choices {
                    localized.push(Choice {
                        label: self.localizer.localize(&choice.label, language).await,
                        callback_id: choice.callback_id,
                    });
                }
                Some(Prompt::Choices(localized))
            }
            None => None,
        };

        Reply {
            text,
            markdown: draft.markdown,
            prompt,
        }
    }
}

fn is_help_request(normalized: &str) -> bool {
    HELP_KEYWORDS
        .iter()
        .any(|keyword| normalized.contains(keyword))
}

fn failure_text(kind: FacilityKind, err: &PortError) -> String {
    match err {
        PortError::UnsupportedKind => {
            format!("Searching for a {} is not available here.", kind.label())
        }
        _ => format!(
            "The {} service is unavailable right now. Please try again later.",
            kind.label()
        ),
    }
}

fn format_found(
    origin: Coordinate,
    plan: &SearchPlan,
    ranked: &[RankedFacility],
    classification: Option<&ClassificationResult>,
) -> String {
    let mut lines = Vec::new();

    if let Some(result) = classification {
        lines.push(format!(
            "For *{}* ({}, {} bin):",
            result.label, result.category, result.bin_color
        ));
    }

    match ranked {
        [single] => {
            lines.push(format!(
                "Nearest {}: *{}*",
                plan.kind.label(),
                single.facility.name
            ));
            lines.push(format!("Distance: ~{:.0} m", single.distance_meters));
            lines.extend(details(single, classification));
            lines.push(format!(
                "[Directions]({})",
                directions_link(origin, single.facility.coordinate)
            ));
        }
        many => {
            lines.push(format!("Nearest {} options:", plan.kind.label()));
            for (position, entry) in many.iter().enumerate() {
                lines.push(format!(
                    "{}. *{}* ~{:.0} m",
                    position + 1,
                    entry.facility.name,
                    entry.distance_meters
                ));
                lines.extend(details(entry, None));
                lines.push(format!(
                    "[Directions]({})",
                    directions_link(origin, entry.facility.coordinate)
                ));
            }
        }
    }

    lines.join("\n")
}

fn details(entry: &RankedFacility, classification: Option<&ClassificationResult>) -> Vec<String> {
    let facility = &entry.facility;
    let keys: &[(&str, &str)] = match facility.kind {
        FacilityKind::SmartBin => &[
            (attr::DISTRICT, "District"),
            (attr::ACCESSIBILITY, "Access"),
            (attr::MEASURED_AT, "Last measured"),
        ],
        FacilityKind::BulkyWaste => &[
            (attr::STREET, "Street"),
            (attr::DISTRICT, "District"),
            (attr::DATE, "Date"),
            (attr::HOURS, "Time"),
        ],
        FacilityKind::CollectionYard => &[
            (attr::ADDRESS, "Address"),
            (attr::HOURS, "Opening hours"),
            (attr::CONTACT, "Contact"),
        ],
    };
    let mut lines: Vec<String> = keys
        .iter()
        .filter_map(|(key, caption)| {
            facility
                .attribute(key)
                .map(|value| format!("{caption}: {value}"))
        })
        .collect();

    if facility.kind != FacilityKind::SmartBin {
        return lines;
    }

    match classification {
        Some(result) if !result.category.container_keywords().is_empty() => {
            let keywords = result.category.container_keywords();
            let matching = facility.fill_levels().find(|(trash_type, _)| {
                let trash_type = trash_type.to_lowercase();
                keywords.iter().any(|keyword| trash_type.contains(keyword))
            });
            lines.push(match matching {
                Some((trash_type, level)) => format!("{trash_type} container: {level} full"),
                None => format!("No {} container reported here.", result.category),
            });
        }
        _ => {
            let levels: Vec<String> = facility
                .fill_levels()
                .map(|(trash_type, level)| format!("{trash_type} {level}"))
                .collect();
            if !levels.is_empty() {
                lines.push(format!("Fill levels: {}", levels.join(", ")));
            }
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_shortcut_matches_keywords() {
        assert!(is_help_request("help me"));
        assert!(is_help_request("more info please"));
        assert!(is_help_request("so what can you do?"));
        assert!(!is_help_request("where is the nearest bin"));
    }

    #[test]
    fn unavailable_and_unsupported_read_differently() {
        let unavailable = failure_text(
            FacilityKind::CollectionYard,
            &PortError::ProviderUnavailable("down".into()),
        );
        assert!(unavailable.contains("try again later"));

        let unsupported = failure_text(FacilityKind::BulkyWaste, &PortError::UnsupportedKind);
        assert!(unsupported.contains("not available"));
    }
}
