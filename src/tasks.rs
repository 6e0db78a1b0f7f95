//! Async task management for non-blocking API operations.
//!
//! Remote calls run in background tokio tasks while the UI keeps rendering.
//! Each task sends an [`ApiMessage`] through an unbounded channel; the main
//! loop drains it with `try_recv()` once per iteration and routes the result
//! to the screen that asked for it.
//!
//! Results cross the channel as [`RemoteFailure`] rather than `ApiError`, so
//! the UI can tell validation, server-supplied, generic and authentication
//! failures apart without holding on to transport errors.
//!
//! The UI never spawns anything itself. It queues [`Command`]s, and the main
//! loop hands them to a [`Dispatcher`] that owns the clients and the session.

use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::actions::{BulkRequest, Ticket};
use crate::api::auth::store_token;
use crate::api::types::{Message, NetworkGraph, Project, TreeNode};
use crate::api::{
    ApiError, GatewayClient, GuardOutcome, IdentityClient, ImportEvent, RemoteFailure,
    SearchRequest, SessionToken,
};

/// Which message list a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Filesystem,
    Search,
    Bookmarks,
}

/// Monotonic request counter. Only the latest request's response is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Generation(u64);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request and return its number.
    pub fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    /// Whether `generation` belongs to the latest request.
    pub fn is_current(&self, generation: u64) -> bool {
        self.0 == generation
    }
}

/// A file produced on the backend and where to fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Path as reported by the backend.
    pub path: String,
    /// `{api_url}/file/{path}`.
    pub url: String,
}

impl Download {
    fn new(client: &GatewayClient, path: String) -> Self {
        Self {
            url: client.file_url(&path),
            path,
        }
    }
}

/// Messages sent from background tasks to the main event loop.
#[derive(Debug)]
pub enum ApiMessage {
    /// Result of the identity-provider session check.
    SessionChecked(Result<GuardOutcome, RemoteFailure>),

    ProjectsFetched(Result<Vec<Project>, RemoteFailure>),

    ProjectCreated(Result<Project, RemoteFailure>),

    /// The backend switched its active project.
    ProjectActivated {
        uuid: String,
        result: Result<(), RemoteFailure>,
    },

    TreeFetched(Result<Vec<TreeNode>, RemoteFailure>),

    /// A message list (search, tree selection, bookmarks) arrived.
    MessagesFetched {
        list: ListKind,
        generation: u64,
        result: Result<Vec<Message>, RemoteFailure>,
    },

    /// A bulk-action request finished.
    BulkCompleted {
        list: ListKind,
        ticket: Ticket,
        result: Result<String, RemoteFailure>,
    },

    NetworkFetched(Result<NetworkGraph, RemoteFailure>),

    /// Export finished; carries the archive location.
    ExportFinished(Result<Download, RemoteFailure>),

    /// Report finished; carries the report location.
    ReportFinished(Result<Download, RemoteFailure>),

    /// One event of the import progress stream.
    ImportProgress {
        project: String,
        result: Result<ImportEvent, RemoteFailure>,
    },

    /// The import stream closed without completing.
    ImportStreamClosed { project: String },
}

/// Spawns background tasks for async operations.
///
/// Each method clones what it needs and spawns a tokio task that sends its
/// result through the channel.
#[derive(Clone)]
pub struct TaskSpawner {
    tx: mpsc::UnboundedSender<ApiMessage>,
}

impl TaskSpawner {
    /// Create a new TaskSpawner with the given channel sender.
    pub fn new(tx: mpsc::UnboundedSender<ApiMessage>) -> Self {
        Self { tx }
    }

    /// Check the session with the identity provider.
    pub fn spawn_session_check(&self, identity: &IdentityClient, token: Option<SessionToken>) {
        let tx = self.tx.clone();
        let identity = identity.clone();
        tokio::spawn(async move {
            let result = identity
                .check(token.as_ref())
                .await
                .map_err(RemoteFailure::from);
            let _ = tx.send(ApiMessage::SessionChecked(result));
        });
    }

    pub fn spawn_fetch_projects(&self, client: &GatewayClient) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client.list_projects().await.map_err(RemoteFailure::from);
            let _ = tx.send(ApiMessage::ProjectsFetched(result));
        });
    }

    pub fn spawn_create_project(&self, client: &GatewayClient, name: String) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client
                .create_project(&name)
                .await
                .map_err(RemoteFailure::from);
            let _ = tx.send(ApiMessage::ProjectCreated(result));
        });
    }

    pub fn spawn_set_project(&self, client: &GatewayClient, uuid: String) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client.set_project(&uuid).await.map_err(RemoteFailure::from);
            let _ = tx.send(ApiMessage::ProjectActivated { uuid, result });
        });
    }

    pub fn spawn_fetch_tree(&self, client: &GatewayClient) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client.evidence_tree().await.map_err(RemoteFailure::from);
            let _ = tx.send(ApiMessage::TreeFetched(result));
        });
    }

    /// Run a search for `list`, tagged with `generation`.
    pub fn spawn_search(
        &self,
        client: &GatewayClient,
        list: ListKind,
        generation: u64,
        request: SearchRequest,
    ) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client.search(&request).await.map_err(RemoteFailure::from);
            let _ = tx.send(ApiMessage::MessagesFetched {
                list,
                generation,
                result,
            });
        });
    }

    pub fn spawn_fetch_bookmarks(&self, client: &GatewayClient, generation: u64) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client.list_bookmarks().await.map_err(RemoteFailure::from);
            let _ = tx.send(ApiMessage::MessagesFetched {
                list: ListKind::Bookmarks,
                generation,
                result,
            });
        });
    }

    /// Execute the requests produced by a bulk action, one task each.
    pub fn spawn_bulk(&self, client: &GatewayClient, list: ListKind, requests: Vec<BulkRequest>) {
        for request in requests {
            let tx = self.tx.clone();
            let client = client.clone();
            tokio::spawn(async move {
                let ticket = request.ticket();
                let result = match &request {
                    BulkRequest::AddBookmarks { ids, .. } => client.add_bookmarks(ids).await,
                    BulkRequest::RemoveBookmark { id, .. } => client.remove_bookmark(id).await,
                    BulkRequest::AddTag { ids, tag, .. } => client.add_tag(ids, tag).await,
                }
                .map_err(RemoteFailure::from);
                let _ = tx.send(ApiMessage::BulkCompleted {
                    list,
                    ticket,
                    result,
                });
            });
        }
    }

    pub fn spawn_fetch_network(&self, client: &GatewayClient) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client.network().await.map_err(RemoteFailure::from);
            let _ = tx.send(ApiMessage::NetworkFetched(result));
        });
    }

    pub fn spawn_export(&self, client: &GatewayClient, extensions: String) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client
                .export_attachments(&extensions)
                .await
                .map(|path| Download::new(&client, path))
                .map_err(RemoteFailure::from);
            let _ = tx.send(ApiMessage::ExportFinished(result));
        });
    }

    pub fn spawn_report(&self, client: &GatewayClient) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client
                .create_report()
                .await
                .map(|path| Download::new(&client, path))
                .map_err(RemoteFailure::from);
            let _ = tx.send(ApiMessage::ReportFinished(result));
        });
    }

    /// Follow the import progress stream of a project until it completes,
    /// fails or closes.
    pub fn spawn_import_progress(&self, client: &GatewayClient, project: String) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let mut stream = match client.import_progress(&project).await {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = tx.send(ApiMessage::ImportProgress {
                        project,
                        result: Err(RemoteFailure::from(e)),
                    });
                    return;
                }
            };

            loop {
                match stream.next_event().await {
                    Ok(Some(event)) => {
                        let done = event == ImportEvent::Complete;
                        if tx
                            .send(ApiMessage::ImportProgress {
                                project: project.clone(),
                                result: Ok(event),
                            })
                            .is_err()
                        {
                            debug!("UI gone, dropping import stream");
                            return;
                        }
                        if done {
                            return;
                        }
                    }
                    Ok(None) => {
                        let _ = tx.send(ApiMessage::ImportStreamClosed { project });
                        return;
                    }
                    Err(e) => {
                        let _ = tx.send(ApiMessage::ImportProgress {
                            project,
                            result: Err(RemoteFailure::from(e)),
                        });
                        return;
                    }
                }
            }
        });
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Remote work requested by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask the identity provider whether the session is valid.
    CheckSession,
    /// Store a pasted session token, then check it.
    SignIn(String),
    FetchProjects,
    CreateProject(String),
    SetProject(String),
    FetchTree,
    Search {
        list: ListKind,
        generation: u64,
        request: SearchRequest,
    },
    FetchBookmarks {
        generation: u64,
    },
    Bulk {
        list: ListKind,
        requests: Vec<BulkRequest>,
    },
    FetchNetwork,
    Export(String),
    Report,
    WatchImport(String),
}

impl Command {
    /// Label for the loading indicator.
    pub fn label(&self) -> &'static str {
        match self {
            Command::CheckSession | Command::SignIn(_) => "Checking session...",
            Command::FetchProjects => "Loading projects...",
            Command::CreateProject(_) => "Creating project...",
            Command::SetProject(_) => "Opening project...",
            Command::FetchTree => "Loading evidence tree...",
            Command::Search { .. } => "Searching...",
            Command::FetchBookmarks { .. } => "Loading bookmarks...",
            Command::Bulk { .. } => "Saving changes...",
            Command::FetchNetwork => "Loading network...",
            Command::Export(_) => "Exporting attachments...",
            Command::Report => "Creating report...",
            Command::WatchImport(_) => "Importing...",
        }
    }

    /// The responses a task for this command would have sent had it failed
    /// with `failure`. Used when the command cannot be started at all, so
    /// the screens leave their in-flight state.
    pub fn into_failures(self, failure: RemoteFailure) -> Vec<ApiMessage> {
        let message = match self {
            Command::CheckSession | Command::SignIn(_) => ApiMessage::SessionChecked(Err(failure)),
            Command::FetchProjects => ApiMessage::ProjectsFetched(Err(failure)),
            Command::CreateProject(_) => ApiMessage::ProjectCreated(Err(failure)),
            Command::SetProject(uuid) => ApiMessage::ProjectActivated {
                uuid,
                result: Err(failure),
            },
            Command::FetchTree => ApiMessage::TreeFetched(Err(failure)),
            Command::Search {
                list, generation, ..
            } => ApiMessage::MessagesFetched {
                list,
                generation,
                result: Err(failure),
            },
            Command::FetchBookmarks { generation } => ApiMessage::MessagesFetched {
                list: ListKind::Bookmarks,
                generation,
                result: Err(failure),
            },
            Command::Bulk { list, requests } => {
                return requests
                    .iter()
                    .map(|request| ApiMessage::BulkCompleted {
                        list,
                        ticket: request.ticket(),
                        result: Err(failure.clone()),
                    })
                    .collect();
            }
            Command::FetchNetwork => ApiMessage::NetworkFetched(Err(failure)),
            Command::Export(_) => ApiMessage::ExportFinished(Err(failure)),
            Command::Report => ApiMessage::ReportFinished(Err(failure)),
            Command::WatchImport(project) => ApiMessage::ImportProgress {
                project,
                result: Err(failure),
            },
        };
        vec![message]
    }
}

/// Owns the remote clients and turns commands into background tasks.
pub struct Dispatcher {
    spawner: TaskSpawner,
    identity: IdentityClient,
    profile: String,
    api_url: String,
    session: Option<SessionToken>,
    gateway: Option<GatewayClient>,
}

impl Dispatcher {
    /// Create a dispatcher; `session` is the token found in the keyring, if any.
    pub fn new(
        spawner: TaskSpawner,
        identity: IdentityClient,
        profile: &str,
        api_url: &str,
        session: Option<SessionToken>,
    ) -> Result<Self, ApiError> {
        let mut dispatcher = Self {
            spawner,
            identity,
            profile: profile.to_string(),
            api_url: api_url.to_string(),
            session: None,
            gateway: None,
        };
        if let Some(session) = session {
            dispatcher.use_session(session)?;
        }
        Ok(dispatcher)
    }

    fn use_session(&mut self, session: SessionToken) -> Result<(), ApiError> {
        self.gateway = Some(GatewayClient::new(&self.api_url, session.clone())?);
        self.session = Some(session);
        Ok(())
    }

    fn gateway(&self) -> Result<&GatewayClient, ApiError> {
        self.gateway.as_ref().ok_or(ApiError::Unauthorized)
    }

    /// Start the task for `command`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` when a backend call is requested before any session
    /// exists, `Keyring` when a pasted token cannot be stored.
    #[instrument(skip(self, command), fields(command = command.label()))]
    pub fn dispatch(&mut self, command: Command) -> Result<(), ApiError> {
        match command {
            Command::CheckSession => {
                self.spawner
                    .spawn_session_check(&self.identity, self.session.clone());
            }
            Command::SignIn(token) => {
                store_token(&self.profile, token.trim())?;
                self.use_session(SessionToken::new(&token))?;
                info!(profile = %self.profile, "Stored new session token");
                self.spawner
                    .spawn_session_check(&self.identity, self.session.clone());
            }
            Command::FetchProjects => self.spawner.spawn_fetch_projects(self.gateway()?),
            Command::CreateProject(name) => {
                self.spawner.spawn_create_project(self.gateway()?, name)
            }
            Command::SetProject(uuid) => self.spawner.spawn_set_project(self.gateway()?, uuid),
            Command::FetchTree => self.spawner.spawn_fetch_tree(self.gateway()?),
            Command::Search {
                list,
                generation,
                request,
            } => self
                .spawner
                .spawn_search(self.gateway()?, list, generation, request),
            Command::FetchBookmarks { generation } => self
                .spawner
                .spawn_fetch_bookmarks(self.gateway()?, generation),
            Command::Bulk { list, requests } => {
                self.spawner.spawn_bulk(self.gateway()?, list, requests)
            }
            Command::FetchNetwork => self.spawner.spawn_fetch_network(self.gateway()?),
            Command::Export(extensions) => self.spawner.spawn_export(self.gateway()?, extensions),
            Command::Report => self.spawner.spawn_report(self.gateway()?),
            Command::WatchImport(project) => self
                .spawner
                .spawn_import_progress(self.gateway()?, project),
        }
        Ok(())
    }
}

/// Create a new task channel and spawner.
///
/// Returns a tuple of (receiver, spawner). The receiver should be polled
/// in the main event loop, and the spawner should be used to spawn tasks.
pub fn create_task_channel() -> (mpsc::UnboundedReceiver<ApiMessage>, TaskSpawner) {
    let (tx, rx) = mpsc::unbounded_channel();
    (rx, TaskSpawner::new(tx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_only_latest_is_current() {
        let mut generation = Generation::new();
        let first = generation.next();
        let second = generation.next();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }

    #[tokio::test]
    async fn test_channel_delivers_messages() {
        let (mut rx, spawner) = create_task_channel();
        spawner
            .tx
            .send(ApiMessage::ImportStreamClosed {
                project: "p1".into(),
            })
            .unwrap();
        match rx.try_recv() {
            Ok(ApiMessage::ImportStreamClosed { project }) => assert_eq!(project, "p1"),
            other => panic!("Unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_command_labels() {
        assert_eq!(Command::FetchProjects.label(), "Loading projects...");
        assert_eq!(
            Command::FetchBookmarks { generation: 1 }.label(),
            "Loading bookmarks..."
        );
    }

    #[test]
    fn test_into_failures_mirrors_the_command() {
        let failure = RemoteFailure::from(ApiError::Unauthorized);
        let messages = Command::SetProject("p1".into()).into_failures(failure.clone());
        assert!(matches!(
            messages.as_slice(),
            [ApiMessage::ProjectActivated { uuid, result: Err(_) }] if uuid == "p1"
        ));

        let messages = Command::FetchBookmarks { generation: 4 }.into_failures(failure);
        assert!(matches!(
            messages.as_slice(),
            [ApiMessage::MessagesFetched {
                list: ListKind::Bookmarks,
                generation: 4,
                result: Err(_),
            }]
        ));
    }

    #[tokio::test]
    async fn test_gateway_commands_need_a_session() {
        let (_rx, spawner) = create_task_channel();
        let identity = IdentityClient::new("http://127.0.0.1:9").unwrap();
        let mut dispatcher =
            Dispatcher::new(spawner, identity, "lab", "http://127.0.0.1:9", None).unwrap();
        let error = tokio_test::assert_err!(dispatcher.dispatch(Command::FetchProjects));
        assert!(matches!(error, ApiError::Unauthorized));
        tokio_test::assert_ok!(dispatcher.dispatch(Command::CheckSession));
    }

    #[tokio::test]
    async fn test_dispatcher_rejects_invalid_api_url() {
        let (_rx, spawner) = create_task_channel();
        let identity = IdentityClient::new("http://127.0.0.1:9").unwrap();
        let result = Dispatcher::new(
            spawner,
            identity,
            "lab",
            "not a url",
            Some(SessionToken::new("t")),
        );
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_failed_connection_reports_generic_failure() {
        let (mut rx, spawner) = create_task_channel();
        // Port 9 (discard) on localhost refuses connections in test sandboxes.
        let client = GatewayClient::new("http://127.0.0.1:9", SessionToken::new("t")).unwrap();
        spawner.spawn_export(&client, "pdf".into());

        match rx.recv().await {
            Some(ApiMessage::ExportFinished(Err(failure))) => {
                assert!(failure.redirect().is_none());
            }
            other => panic!("Unexpected message {:?}", other),
        }
    }
}
