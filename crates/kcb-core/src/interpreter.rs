//! Command interpreter: turns inbound messages into gallery mutations and replies.
//!
//! Every event is authorized against the single owner first. Failures never
//! escape as errors to the transport loop; they become a reply in the same chat.

use tracing::{debug, info, warn};

use crate::{
    domain::{PhotoId, UserId},
    errors::Error,
    gallery::GalleryStore,
    messaging::{
        port::DeliveryChannel,
        types::{Inbound, InboundPayload, PhotoRef},
    },
    security::is_owner,
    session::UploadSession,
    Result,
};

const GALLERY_ARG: &str = "gallery";

const UPLOAD_USAGE: &str = "Usage: /upload gallery";
const LIST_USAGE: &str = "Usage: /list gallery";
const DELETE_USAGE: &str = "Usage: /delete gallery [id]";

/// Split `/cmd@botname rest` into a lower-cased command name and the trimmed rest.
pub fn parse_command(text: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Gallery commands understood by the bot, with their raw argument text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GalleryCommand {
    Start,
    Upload(String),
    List(String),
    Delete(String),
}

impl GalleryCommand {
    /// `None` for plain text and commands the bot does not handle.
    pub fn from_text(text: &str) -> Option<Self> {
        if !text.trim_start().starts_with('/') {
            return None;
        }
        let (cmd, rest) = parse_command(text);
        match cmd.as_str() {
            "start" | "help" => Some(Self::Start),
            "upload" => Some(Self::Upload(rest)),
            "list" => Some(Self::List(rest)),
            "delete" => Some(Self::Delete(rest)),
            _ => None,
        }
    }
}

enum Event<'a> {
    Command(GalleryCommand),
    Photo(&'a [PhotoRef]),
}

pub struct CommandInterpreter {
    owner: UserId,
    store: GalleryStore,
}

impl CommandInterpreter {
    pub fn new(owner: UserId, store: GalleryStore) -> Self {
        Self { owner, store }
    }

    pub fn store(&self) -> &GalleryStore {
        &self.store
    }

    /// Handle one inbound message for the conversation owning `session`.
    ///
    /// Returns an error only when the reply itself could not be delivered.
    pub async fn handle(
        &self,
        session: &mut UploadSession,
        inbound: &Inbound,
        channel: &dyn DeliveryChannel,
    ) -> Result<()> {
        let event = match &inbound.payload {
            InboundPayload::Text(text) => match GalleryCommand::from_text(text) {
                Some(cmd) => Event::Command(cmd),
                None => {
                    debug!(chat = inbound.chat_id.0, "Ignoring non-gallery text");
                    return Ok(());
                }
            },
            InboundPayload::Photo(sizes) => Event::Photo(sizes),
        };

        let reply = match self.dispatch(session, inbound.sender, event, channel).await {
            Ok(reply) => reply,
            Err(e) => {
                match &e {
                    Error::Unauthorized => {
                        warn!(sender = ?inbound.sender.map(|u| u.0), "Rejected message from non-owner")
                    }
                    Error::Usage(_) | Error::InvalidId(_) | Error::NotFound(_) => {
                        debug!(error = %e, "Command rejected")
                    }
                    other => warn!(error = %other, "Command failed"),
                }
                e.user_message()
            }
        };

        channel.send_text(inbound.chat_id, &reply).await?;
        Ok(())
    }

    async fn dispatch(
        &self,
        session: &mut UploadSession,
        sender: Option<UserId>,
        event: Event<'_>,
        channel: &dyn DeliveryChannel,
    ) -> Result<String> {
        if !is_owner(sender, self.owner) {
            return Err(Error::Unauthorized);
        }

        match event {
            Event::Command(GalleryCommand::Start) => self.welcome(),
            Event::Command(GalleryCommand::Upload(args)) => {
                require_gallery_arg(&args, UPLOAD_USAGE)?;
                session.begin_upload();
                Ok("Send the photo now. It will be added to the gallery.".to_string())
            }
            Event::Command(GalleryCommand::List(args)) => {
                require_gallery_arg(&args, LIST_USAGE)?;
                self.render_list()
            }
            Event::Command(GalleryCommand::Delete(args)) => {
                let id = parse_delete_args(&args)?;
                self.store.remove(id)?;
                Ok(format!("Photo #{} deleted from gallery.", id.0))
            }
            Event::Photo(sizes) => self.accept_photo(session, sizes, channel).await,
        }
    }

    fn welcome(&self) -> Result<String> {
        let stats = self.store.stats()?;
        let latest = stats.latest_at.as_deref().unwrap_or("never");
        Ok(format!(
            "Welcome to Kilometres' Collection Bot!\n\n\
Photos in gallery: {}\n\
Latest upload: {latest}\n\n\
Commands:\n\
/upload gallery - Upload a photo to the gallery\n\
/list gallery - List all photos\n\
/delete gallery [id] - Delete a photo by ID",
            stats.photos
        ))
    }

    fn render_list(&self) -> Result<String> {
        let entries = self.store.list()?;
        if entries.is_empty() {
            return Ok("Gallery is empty.".to_string());
        }

        let lines = entries
            .iter()
            .map(|e| format!("{}. {}", e.position, e.label()))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!("Gallery Photos:\n{lines}"))
    }

    async fn accept_photo(
        &self,
        session: &mut UploadSession,
        sizes: &[PhotoRef],
        channel: &dyn DeliveryChannel,
    ) -> Result<String> {
        if !session.consume_if_awaiting() {
            return Ok("Use /upload gallery first to enable photo upload mode.".to_string());
        }

        let Some(best) = PhotoRef::largest(sizes) else {
            return Ok("No photo received.".to_string());
        };

        let id = self.store.next_id()?;
        let path = self.store.photo_path(id);

        match channel.fetch_photo(best, &path).await {
            Ok(bytes) => debug!(photo = %id, bytes, "Downloaded photo"),
            Err(e) => {
                let _ = tokio::fs::remove_file(&path).await;
                warn!(photo = %id, error = %e, "Photo download failed");
                return Ok(format!(
                    "Failed to download photo: {}",
                    e.to_string().chars().take(100).collect::<String>()
                ));
            }
        }

        if let Err(e) = self.store.append(id) {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }

        info!(photo = %id, "Photo uploaded");
        Ok(format!("Photo #{} uploaded to the gallery.", id.0))
    }
}

fn require_gallery_arg(args: &str, usage: &'static str) -> Result<()> {
    if args.trim().eq_ignore_ascii_case(GALLERY_ARG) {
        Ok(())
    } else {
        Err(Error::Usage(usage))
    }
}

fn parse_delete_args(args: &str) -> Result<PhotoId> {
    let mut parts = args.split_whitespace();
    let target = parts.next();
    let raw_id = parts.next();

    let (Some(target), Some(raw_id)) = (target, raw_id) else {
        return Err(Error::Usage(DELETE_USAGE));
    };
    if !target.eq_ignore_ascii_case(GALLERY_ARG) {
        return Err(Error::Usage(DELETE_USAGE));
    }

    raw_id
        .parse::<u64>()
        .map(PhotoId)
        .map_err(|_| Error::InvalidId(raw_id.to_string()))
}
