//! Executes parsed `/incident` commands against the store.

use std::sync::Arc;

use tracing::info;

use super::command::{IncidentCommand, SlackReply, SlashCommand};
use super::model::{format_duration, IncidentUpdate, NewIncident};
use super::store::IncidentStore;
use crate::observability::metrics;

pub struct IncidentService {
    store: Arc<dyn IncidentStore>,
}

impl IncidentService {
    pub fn new(store: Arc<dyn IncidentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn IncidentStore> {
        &self.store
    }

    /// Run the command in `payload` at `now` (epoch seconds).
    /// Every outcome, including user errors, is a Slack reply.
    pub fn execute(&self, payload: &SlashCommand, now: u64) -> SlackReply {
        let command = match IncidentCommand::parse(&payload.text) {
            Ok(command) => command,
            Err(err) => {
                metrics::record_incident_command("invalid");
                return err.into();
            }
        };
        metrics::record_incident_command(command.action());

        match command {
            IncidentCommand::Start { severity, title } => {
                let incident = self.store.create(NewIncident {
                    title,
                    severity,
                    commander: payload.user_name.clone(),
                    channel_id: payload.channel_id.clone(),
                    started_at: now,
                });
                info!(
                    incident_id = %incident.id,
                    severity = %incident.severity,
                    page_on_call = incident.page_on_call,
                    "Incident started"
                );

                let mut text = format!(
                    "✅ *Incident {} created*\n\n📋 *Title:* {}\n{} *Severity:* {}\n👤 *Commander:* <@{}>",
                    incident.id,
                    incident.title,
                    incident.severity.emoji(),
                    incident.severity,
                    payload.user_id,
                );
                if incident.page_on_call {
                    text.push_str("\n📟 On-call engineer will be paged");
                }
                SlackReply::in_channel(text)
            }
            IncidentCommand::Update { id, message } => {
                let update = IncidentUpdate {
                    author: payload.user_name.clone(),
                    message,
                    posted_at: now,
                };
                match self.store.add_update(&id, update) {
                    Ok(incident) => {
                        info!(incident_id = %id, updates = incident.updates.len(), "Incident updated");
                        SlackReply::ephemeral(format!(
                            "✅ Status update posted to <#{}>",
                            incident.channel_id
                        ))
                    }
                    Err(err) => SlackReply::ephemeral(err.to_string()),
                }
            }
            IncidentCommand::Resolve { id } => match self.store.resolve(&id, now) {
                Ok(incident) => {
                    let duration = format_duration(incident.duration_minutes(now));
                    info!(
                        incident_id = %id,
                        duration = %duration,
                        sla_violated = incident.is_sla_violated(now),
                        "Incident resolved"
                    );
                    SlackReply::in_channel(format!(
                        "✅ Incident {id} resolved by <@{}>\n⏱️ *Duration:* {duration}",
                        payload.user_id
                    ))
                }
                Err(err) => SlackReply::ephemeral(err.to_string()),
            },
        }
    }
}
