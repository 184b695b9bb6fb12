//! Command handlers. Each one opens what it needs and prints to stdout.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use mentor_chat::{ChatError, ChatSession, Conversation, Persona};
use mentor_core::error::MentorError;
use mentor_core::types::{Chat, ChatMessage, Mode, Role};
use mentor_core::MentorConfig;
use mentor_image::{ImageLookup, ImageSize, WikimediaClient};
use mentor_llm::{CompletionClient, OpenAiClient};
use mentor_store::{ChatRepository, Database, SqliteDocumentStore};

pub fn open_repository(data_dir: &Path) -> Result<ChatRepository, MentorError> {
    let db = Arc::new(Database::open_in(data_dir)?);
    Ok(ChatRepository::new(Arc::new(SqliteDocumentStore::new(db))))
}

pub fn list_chats(repo: &ChatRepository) -> Result<(), MentorError> {
    let chats = repo.list_chats()?;
    if chats.is_empty() {
        println!("No chats yet. Start one with `mentor new`.");
    }
    for chat in &chats {
        println!("{}", render_chat(chat));
    }
    Ok(())
}

pub fn new_chat(repo: &ChatRepository, title: Option<&str>) -> Result<(), MentorError> {
    let chat = repo.create_chat(title)?;
    println!("{}", chat.chat_id);
    Ok(())
}

pub fn show_chat(repo: &ChatRepository, chat_id: &str) -> Result<(), MentorError> {
    let chat = repo
        .find_chat(chat_id)?
        .ok_or_else(|| ChatError::ChatNotFound(chat_id.to_string()))?;
    println!("{}\n", render_chat(&chat));
    for message in repo.list_messages(chat_id)? {
        println!("{}", render_message(&message));
    }
    Ok(())
}

/// Completion client for the configured provider.
pub fn completion_client(config: &MentorConfig) -> Result<Arc<dyn CompletionClient>, MentorError> {
    Ok(Arc::new(OpenAiClient::from_config(&config.completion)?))
}

pub struct AskOptions<'a> {
    pub mode: Mode,
    pub grade: Option<&'a str>,
    pub personality: Option<&'a str>,
    pub with_image: bool,
}

fn open_session(
    repo: ChatRepository,
    config: &MentorConfig,
    client: Arc<dyn CompletionClient>,
    chat_id: &str,
    options: &AskOptions<'_>,
) -> Result<ChatSession, MentorError> {
    let persona = Persona::resolve(options.grade, options.personality, &config.persona);
    let conversation = Conversation::new(persona)
        .with_explain_further_text(config.conversation.explain_further_text);

    let mut session = ChatSession::open(repo, client, chat_id, conversation)?;
    if options.with_image && config.image.enabled {
        session = session.with_images(
            Arc::new(WikimediaClient::from_config(&config.image)),
            ImageSize::from(&config.image),
        );
    }
    Ok(session)
}

pub async fn ask(
    repo: ChatRepository,
    config: &MentorConfig,
    client: Arc<dyn CompletionClient>,
    chat_id: &str,
    prompt: &str,
    options: AskOptions<'_>,
) -> Result<(), MentorError> {
    let session = open_session(repo, config, client, chat_id, &options)?;
    match session.submit(prompt, options.mode).await? {
        Some(reply) => println!("{}", render_message(&reply)),
        None => tracing::info!("Empty prompt, nothing sent"),
    }
    Ok(())
}

/// Answer the unanswered prompt a failed `ask` left at the end of the chat.
pub async fn retry(
    repo: ChatRepository,
    config: &MentorConfig,
    client: Arc<dyn CompletionClient>,
    chat_id: &str,
    options: AskOptions<'_>,
) -> Result<(), MentorError> {
    let session = open_session(repo, config, client, chat_id, &options)?;
    let reply = session.retry(options.mode).await?;
    println!("{}", render_message(&reply));
    Ok(())
}

pub async fn complete(
    config: &MentorConfig,
    client: &dyn CompletionClient,
    prompt: &str,
) -> Result<(), MentorError> {
    let conversation = Conversation::new(Persona::from(&config.persona));
    match conversation.complete_text(client, prompt).await? {
        Some(text) => println!("{}", text),
        None => tracing::info!("Empty prompt, nothing sent"),
    }
    Ok(())
}

/// Write the default configuration. An existing file is kept unless `force`.
pub fn init_config(path: &Path, force: bool) -> Result<(), MentorError> {
    if path.exists() && !force {
        return Err(MentorError::Config(format!(
            "{} already exists, pass --force to overwrite",
            path.display()
        )));
    }
    MentorConfig::default().save(path)?;
    println!("{}", path.display());
    Ok(())
}

pub async fn image(config: &MentorConfig, query: &str, size: ImageSize) -> Result<(), MentorError> {
    let client = WikimediaClient::from_config(&config.image);
    match client.fetch_image(query, size).await {
        Some(url) => println!("{}", url),
        None => println!(
            "No image: {}",
            client.last_error().unwrap_or_else(|| "unknown error".to_string())
        ),
    }
    Ok(())
}

fn render_chat(chat: &Chat) -> String {
    match &chat.title {
        Some(title) => format!("{}  {}  {}", chat.chat_id, chat.created_at, title),
        None => format!("{}  {}", chat.chat_id, chat.created_at),
    }
}

fn render_message(message: &ChatMessage) -> String {
    let speaker = match message.role {
        Role::User => "You",
        Role::Ai => "Mentor",
    };
    let mut out = format!("{}: {}", speaker, message.text);
    if let Some(points) = &message.bullet_points {
        for (i, point) in points.iter().enumerate() {
            let _ = write!(
                out,
                "\n  {}. {}\n     {}\n     => {}",
                i + 1,
                point.heading,
                point.explanation,
                point.output
            );
        }
    }
    if let Some(url) = message.image_url.as_deref().filter(|u| !u.is_empty()) {
        let _ = write!(out, "\n  [image] {}", url);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::types::BulletPoint;
    use mentor_llm::{MockCompletionClient, StructuredAnswer};
    use mentor_store::DB_FILE;
    use tempfile::TempDir;

    fn text_only(mode: Mode) -> AskOptions<'static> {
        AskOptions {
            mode,
            grade: None,
            personality: None,
            with_image: false,
        }
    }

    fn tutor_answer(final_answer: &str) -> StructuredAnswer {
        StructuredAnswer {
            steps: vec![BulletPoint {
                heading: "Add".into(),
                explanation: "Two plus two".into(),
                output: "4".into(),
            }],
            final_answer: final_answer.into(),
        }
    }

    #[test]
    fn test_render_user_message() {
        let message = ChatMessage::user("What is 2+2?");
        assert_eq!(render_message(&message), "You: What is 2+2?");
    }

    #[test]
    fn test_render_ai_message_with_steps_and_image() {
        let mut message = ChatMessage::ai(
            "4",
            vec![BulletPoint {
                heading: "Add".into(),
                explanation: "Two plus two".into(),
                output: "4".into(),
            }],
        );
        message.image_url = Some("https://img/four.png".into());

        let rendered = render_message(&message);
        assert!(rendered.starts_with("Mentor: 4\n  1. Add"));
        assert!(rendered.contains("=> 4"));
        assert!(rendered.ends_with("[image] https://img/four.png"));
    }

    #[test]
    fn test_render_skips_empty_image_url() {
        let mut message = ChatMessage::ai("ok", vec![]);
        message.image_url = Some(String::new());
        assert_eq!(render_message(&message), "Mentor: ok");
    }

    #[test]
    fn test_render_chat_with_title() {
        let chat = Chat {
            id: "doc".into(),
            chat_id: "c1".into(),
            created_at: "2024-05-01T10:00:00.000Z".into(),
            title: Some("Algebra".into()),
        };
        assert_eq!(render_chat(&chat), "c1  2024-05-01T10:00:00.000Z  Algebra");
    }

    #[test]
    fn test_commands_against_file_store() {
        let dir = TempDir::new().unwrap();
        let repo = open_repository(dir.path()).unwrap();
        new_chat(&repo, Some("Physics")).unwrap();
        list_chats(&repo).unwrap();

        let chat = repo.list_chats().unwrap().remove(0);
        show_chat(&repo, &chat.chat_id).unwrap();
        assert!(dir.path().join(DB_FILE).exists());
    }

    #[test]
    fn test_show_unknown_chat() {
        let dir = TempDir::new().unwrap();
        let repo = open_repository(dir.path()).unwrap();
        let err = show_chat(&repo, "missing").unwrap_err();
        assert!(matches!(err, MentorError::Chat(_)));
    }

    #[tokio::test]
    async fn test_retry_answers_failed_ask() {
        let dir = TempDir::new().unwrap();
        let repo = open_repository(dir.path()).unwrap();
        let chat = repo.create_chat(None).unwrap();
        let config = MentorConfig::default();
        let client = Arc::new(MockCompletionClient::new());
        client.push_failure("rate limited");
        client.push_answer(&tutor_answer("4"));

        let err = ask(
            repo.clone(),
            &config,
            client.clone(),
            &chat.chat_id,
            "What is 2+2?",
            text_only(Mode::BulletPoints),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MentorError::Completion(_)));
        assert_eq!(repo.list_messages(&chat.chat_id).unwrap().len(), 1);

        // A later invocation reopens the chat from disk.
        let reopened = open_repository(dir.path()).unwrap();
        retry(
            reopened.clone(),
            &config,
            client.clone(),
            &chat.chat_id,
            text_only(Mode::BulletPoints),
        )
        .await
        .unwrap();

        let stored = repo.list_messages(&chat.chat_id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].text, "What is 2+2?");
        assert_eq!(stored[1].role, Role::Ai);
        assert_eq!(stored[1].text, "4");
        assert_eq!(client.request_count(), 2);
        assert_eq!(client.requests()[1].len(), 2);

        let err = retry(reopened, &config, client.clone(), &chat.chat_id, text_only(Mode::BulletPoints))
            .await
            .unwrap_err();
        assert!(matches!(err, MentorError::Chat(_)));
        assert_eq!(client.request_count(), 2);
    }

    #[tokio::test]
    async fn test_complete_sends_single_prompt() {
        let config = MentorConfig::default();
        let client = MockCompletionClient::new();
        client.push_content("Osmosis moves water across a membrane.");

        complete(&config, &client, "  Summarise osmosis ").await.unwrap();
        complete(&config, &client, "   ").await.unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].len(), 1);
        assert_eq!(requests[0][0].content, "Summarise osmosis");
    }

    #[tokio::test]
    async fn test_complete_reports_failure() {
        let client = MockCompletionClient::new();
        client.push_failure("upstream down");
        let err = complete(&MentorConfig::default(), &client, "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, MentorError::Completion(_)));
    }

    #[test]
    fn test_init_config_writes_defaults_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        init_config(&path, false).unwrap();
        let loaded = MentorConfig::load_or_default(&path);
        assert_eq!(loaded.completion.model, MentorConfig::default().completion.model);
        assert_eq!(loaded.persona.grade, "Grade 7");

        std::fs::write(&path, "[persona]\ngrade = \"Grade 9\"\n").unwrap();
        let err = init_config(&path, false).unwrap_err();
        assert!(matches!(err, MentorError::Config(_)));
        assert_eq!(MentorConfig::load_or_default(&path).persona.grade, "Grade 9");

        init_config(&path, true).unwrap();
        assert_eq!(MentorConfig::load_or_default(&path).persona.grade, "Grade 7");
    }
}
