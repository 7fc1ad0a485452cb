//! Action coordinator.
//!
//! Every user intent goes through here: preconditions are checked first,
//! then the request is sent through the [`Transport`], and the outcome is
//! turned into a notification, a re-rendered table and a recorded result.
//! A failed precondition never reaches the network.

mod forms;
mod intents;
pub mod routes;

pub use forms::{BackupForm, GameForm};
pub use intents::{DuplicatePolicy, Intent, Page};

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::errors::{ClientError, Precondition};
use crate::messages::{Catalog, Label, Message};
use crate::models::{Backup, EntityId, Game};
use crate::notify::NotificationChannel;
use crate::render::{detail_lines, Column, RowAction, TableRow, TableSurface, TableView};
use crate::selection::SelectionStore;
use crate::transport::{Method, NormalizedResult, Transport};
use intents::{ActionKey, InFlight};

/// Last known health of the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthStatus {
    #[default]
    Unknown,
    Ok,
    Failing(u16),
    Unreachable,
}

impl HealthStatus {
    /// Short text for a status indicator.
    pub fn indicator(self, catalog: &Catalog) -> String {
        match self {
            HealthStatus::Unknown => catalog.label(Label::NoValue).to_string(),
            HealthStatus::Ok => catalog.label(Label::HealthOk).to_string(),
            HealthStatus::Failing(status) => catalog.message(&Message::HealthError { status }),
            HealthStatus::Unreachable => catalog.message(&Message::HealthUnreachable),
        }
    }
}

/// Outcome of a delete request.
#[derive(Debug, Clone, PartialEq)]
pub enum Deletion {
    Deleted(NormalizedResult),
    /// The user answered no; nothing was sent.
    Declined,
}

/// What a row button did.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    Selected(Game),
    Opened(Game),
    /// The host should show `form` and submit it with
    /// [`ActionCoordinator::update_game`] for `id`.
    Editing { id: EntityId, form: GameForm },
    Restored(NormalizedResult),
    Deletion(Deletion),
}

#[derive(Default)]
struct Views {
    games: TableSurface,
    backups: TableSurface,
    game_rows: Vec<Game>,
    backup_rows: Vec<Backup>,
    health: HealthStatus,
    last_response: Option<NormalizedResult>,
}

/// One request as the coordinator issues it.
struct Call<'a> {
    intent: Intent,
    game: Option<&'a EntityId>,
    backup: Option<&'a EntityId>,
    method: Method,
    path: String,
    payload: Option<Value>,
    /// Shown while waiting; lists show nothing.
    pending: Option<Message>,
    failure: fn(String) -> Message,
    /// Refreshes a mutation triggers skip the duplicate check.
    tracked: bool,
}

impl<'a> Call<'a> {
    fn new(intent: Intent, method: Method, path: String, failure: fn(String) -> Message) -> Self {
        Self {
            intent,
            game: None,
            backup: None,
            method,
            path,
            payload: None,
            pending: None,
            failure,
            tracked: true,
        }
    }

    fn game(mut self, id: &'a EntityId) -> Self {
        self.game = Some(id);
        self
    }

    fn backup(mut self, id: &'a EntityId) -> Self {
        self.backup = Some(id);
        self
    }

    fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    fn pending(mut self, message: Message) -> Self {
        self.pending = Some(message);
        self
    }

    fn tracked(mut self, tracked: bool) -> Self {
        self.tracked = tracked;
        self
    }
}

/// One element of a list response's `data` array.
struct ListItem<E> {
    row: Value,
    id: Option<EntityId>,
    entity: Option<E>,
}

/// Split a list response into its items. Each item keeps its raw form for
/// display; `entity` is `None` when it does not decode as `E`. Returns
/// `None` when `data` is not an array.
fn list_items<E: DeserializeOwned>(result: &NormalizedResult) -> Option<Vec<ListItem<E>>> {
    let items = result.body.json()?.get("data")?.as_array()?;
    let items = items
        .iter()
        .map(|item| {
            let entity = match E::deserialize(item) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    tracing::warn!("Malformed list item {}: {}", item, e);
                    None
                }
            };
            ListItem {
                row: item.clone(),
                id: item.get("id").and_then(|id| EntityId::deserialize(id).ok()),
                entity,
            }
        })
        .collect();
    Some(items)
}

fn precondition_message(precondition: &Precondition) -> Message {
    match precondition {
        Precondition::NoGameSelected => Message::NoGameSelected,
        Precondition::MissingField(field) => Message::MissingField {
            field: field.to_string(),
        },
        Precondition::EmptyPatch => Message::NothingToUpdate,
        Precondition::MissingGameId => Message::MissingGameId,
        Precondition::MissingBackupId => Message::MissingBackupId,
        Precondition::InvalidId(id) => Message::InvalidId { id: id.clone() },
        Precondition::IntentDisabled(intent) => Message::IntentUnavailable {
            intent: intent.to_string(),
        },
        Precondition::GameNotFound(id) => Message::GameNotFound { id: id.clone() },
    }
}

/// Per-page coordinator. Methods take `&self` so a host may run several
/// actions at once.
pub struct ActionCoordinator<T> {
    transport: T,
    page: Page,
    policy: DuplicatePolicy,
    catalog: Catalog,
    selection: SelectionStore,
    notifications: NotificationChannel,
    views: Mutex<Views>,
    in_flight: InFlight,
}

impl<T: Transport> ActionCoordinator<T> {
    pub fn new(
        transport: T,
        page: Page,
        catalog: Catalog,
        selection: SelectionStore,
        notifications: NotificationChannel,
    ) -> Self {
        Self {
            transport,
            page,
            policy: DuplicatePolicy::default(),
            catalog,
            selection,
            notifications,
            views: Mutex::new(Views::default()),
            in_flight: InFlight::default(),
        }
    }

    pub fn from_config(transport: T, page: Page, config: &Config) -> Self {
        Self::new(
            transport,
            page,
            Catalog::new(config.locale),
            SelectionStore::new(),
            NotificationChannel::new(config.notify_dismiss_after),
        )
        .with_duplicate_policy(config.duplicate_policy)
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn notifications(&self) -> &NotificationChannel {
        &self.notifications
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn views(&self) -> MutexGuard<'_, Views> {
        self.views.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn games_view(&self) -> Option<TableView> {
        self.views().games.view().cloned()
    }

    pub fn backups_view(&self) -> Option<TableView> {
        self.views().backups.view().cloned()
    }

    /// Games from the last successful list.
    pub fn games(&self) -> Vec<Game> {
        self.views().game_rows.clone()
    }

    /// Backups from the last successful list.
    pub fn backups(&self) -> Vec<Backup> {
        self.views().backup_rows.clone()
    }

    pub fn health(&self) -> HealthStatus {
        self.views().health
    }

    /// The most recent result, or the synthesized refusal of the most
    /// recent precondition failure.
    pub fn last_response(&self) -> Option<NormalizedResult> {
        self.views().last_response.clone()
    }

    pub fn detail_lines(&self) -> Vec<String> {
        detail_lines(self.selection.get_selected().as_ref(), &self.catalog)
    }

    fn game_columns(&self) -> Vec<Column> {
        let c = &self.catalog;
        let mut columns = vec![
            Column::field("id", c.label(Label::Id)),
            Column::field("name", c.label(Label::Name)),
            Column::field("game_path", c.label(Label::GamePath)),
            Column::field("backup_root", c.label(Label::BackupRoot)),
            Column::field("last_backup_at", c.label(Label::LastBackup)),
        ];
        if self.page.has_game_actions() {
            columns.push(Column::actions(c.label(Label::Actions)));
        }
        columns
    }

    fn backup_columns(&self) -> Vec<Column> {
        let c = &self.catalog;
        let mut columns = vec![
            Column::field("id", c.label(Label::Id)),
            Column::field("name", c.label(Label::Name)),
            Column::field("backup_path", c.label(Label::BackupPath)),
            Column::field("created_at", c.label(Label::Created)),
            Column::field("size_bytes", c.label(Label::Size)),
        ];
        if self.page.has_backup_actions() {
            columns.push(Column::actions(c.label(Label::Actions)));
        }
        columns
    }

    /// Reject an action locally: error notification plus a stand-in result.
    fn refuse(&self, precondition: Precondition) -> ClientError {
        tracing::info!("Refused before sending: {}", precondition);
        self.notifications
            .error(self.catalog.message(&precondition_message(&precondition)));
        self.views().last_response = Some(NormalizedResult::refused(&precondition.to_string()));
        ClientError::Precondition(precondition)
    }

    fn ensure_allowed(&self, intent: Intent) -> Result<(), ClientError> {
        if self.page.allows(intent) {
            Ok(())
        } else {
            Err(self.refuse(Precondition::IntentDisabled(intent)))
        }
    }

    fn require_selection(&self) -> Result<EntityId, ClientError> {
        self.selection
            .selected_id()
            .ok_or_else(|| self.refuse(Precondition::NoGameSelected))
    }

    fn require_id(&self, input: &str, missing: Precondition) -> Result<EntityId, ClientError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(self.refuse(missing));
        }
        EntityId::parse(trimmed)
            .ok_or_else(|| self.refuse(Precondition::InvalidId(trimmed.to_string())))
    }

    fn require_backup_id(&self, backup_id: &str) -> Result<EntityId, ClientError> {
        self.require_id(backup_id, Precondition::MissingBackupId)
    }

    async fn perform(&self, call: Call<'_>) -> Result<NormalizedResult, ClientError> {
        let key = ActionKey {
            intent: call.intent,
            game: call.game.cloned(),
            backup: call.backup.cloned(),
        };
        let _guard = if call.tracked {
            match self.in_flight.begin(key, self.policy) {
                Ok(guard) => Some(guard),
                Err(err) => {
                    tracing::info!("{} already in flight", call.intent);
                    self.notifications
                        .error(self.catalog.message(&Message::AlreadyInProgress {
                            intent: call.intent.to_string(),
                        }));
                    return Err(err);
                }
            }
        } else {
            None
        };

        if let Some(pending) = &call.pending {
            self.notifications.pending(self.catalog.message(pending));
        }

        let result = match self
            .transport
            .send(call.method, &call.path, call.payload)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("{} could not reach the server: {}", call.intent, err);
                let reason = self.catalog.message(&Message::NetworkError);
                self.notifications
                    .error(self.catalog.message(&(call.failure)(reason)));
                return Err(err);
            }
        };

        self.views().last_response = Some(result.clone());

        if !result.succeeded {
            tracing::info!("{} rejected with HTTP {}", call.intent, result.status);
            let reason = result
                .body
                .server_message()
                .unwrap_or_else(|| self.catalog.message(&Message::UnknownError));
            self.notifications
                .error(self.catalog.message(&(call.failure)(reason)));
            return Err(result.into_error());
        }

        Ok(result)
    }

    /// A success whose `data` is not a list: reported like a failed list.
    fn unexpected_list(
        &self,
        result: &NormalizedResult,
        failure: fn(String) -> Message,
    ) -> ClientError {
        tracing::warn!("List response without a data array: {}", result.to_pretty_json());
        let reason = self.catalog.message(&Message::UnexpectedResponse);
        self.notifications
            .error(self.catalog.message(&failure(reason.clone())));
        ClientError::Application {
            status: result.status,
            message: Some(reason),
        }
    }

    async fn fetch_games(&self, tracked: bool) -> Result<Vec<Game>, ClientError> {
        let failure: fn(String) -> Message = |reason| Message::ListGamesFailed { reason };
        let call = Call::new(
            Intent::ListGames,
            Method::Get,
            routes::GAMES.to_string(),
            failure,
        )
        .tracked(tracked);
        let result = match self.perform(call).await {
            Ok(result) => result,
            Err(err) => {
                self.views().games.render_empty();
                return Err(err);
            }
        };
        let Some(items) = list_items::<Game>(&result) else {
            self.views().games.render_empty();
            return Err(self.unexpected_list(&result, failure));
        };

        let rows: Vec<TableRow> = items
            .iter()
            .map(|item| {
                let actions = match &item.id {
                    Some(id) => self.page.game_actions(id),
                    None => Vec::new(),
                };
                TableRow::from_entity(&item.row, actions)
            })
            .collect();
        let games: Vec<Game> = items.into_iter().filter_map(|item| item.entity).collect();

        self.selection.reconcile(&games);
        let columns = self.game_columns();

        let mut views = self.views();
        views.games.render(&rows, &columns);
        views.game_rows = games.clone();
        Ok(games)
    }

    async fn fetch_backups(
        &self,
        game_id: &EntityId,
        tracked: bool,
    ) -> Result<Vec<Backup>, ClientError> {
        let failure: fn(String) -> Message = |reason| Message::ListBackupsFailed { reason };
        let call = Call::new(
            Intent::ListBackups,
            Method::Get,
            routes::backups(game_id),
            failure,
        )
        .game(game_id)
        .tracked(tracked);
        let result = match self.perform(call).await {
            Ok(result) => result,
            Err(err) => {
                self.views().backups.render_empty();
                return Err(err);
            }
        };
        let Some(items) = list_items::<Backup>(&result) else {
            self.views().backups.render_empty();
            return Err(self.unexpected_list(&result, failure));
        };

        let rows: Vec<TableRow> = items
            .iter()
            .map(|item| {
                let actions = match &item.id {
                    Some(id) => self.page.backup_actions(id),
                    None => Vec::new(),
                };
                TableRow::from_entity(&item.row, actions)
            })
            .collect();
        let backups: Vec<Backup> = items.into_iter().filter_map(|item| item.entity).collect();
        let columns = self.backup_columns();

        let mut views = self.views();
        views.backups.render(&rows, &columns);
        views.backup_rows = backups.clone();
        Ok(backups)
    }

    async fn refresh_games(&self) {
        if let Err(e) = self.fetch_games(false).await {
            tracing::warn!("Refreshing games failed: {}", e);
        }
    }

    async fn refresh_backups(&self, game_id: &EntityId) {
        if let Err(e) = self.fetch_backups(game_id, false).await {
            tracing::warn!("Refreshing backups failed: {}", e);
        }
    }

    /// Fetch and render all games.
    pub async fn list_games(&self) -> Result<Vec<Game>, ClientError> {
        self.ensure_allowed(Intent::ListGames)?;
        self.fetch_games(true).await
    }

    /// Register a game. On success the form is cleared and the list refreshed.
    pub async fn create_game(&self, form: &mut GameForm) -> Result<NormalizedResult, ClientError> {
        self.ensure_allowed(Intent::CreateGame)?;
        let request = form.to_create_request().map_err(|p| self.refuse(p))?;
        let payload = serde_json::to_value(&request)?;

        let call = Call::new(
            Intent::CreateGame,
            Method::Post,
            routes::GAMES.to_string(),
            |reason| Message::CreateGameFailed { reason },
        )
        .payload(payload)
        .pending(Message::CreatingGame);
        let result = self.perform(call).await?;

        tracing::info!("Created game {}", request.name);
        form.reset();
        self.refresh_games().await;
        self.notifications
            .success(self.catalog.message(&Message::GameCreated));
        Ok(result)
    }

    /// Patch only the filled-in fields of game `id`.
    pub async fn update_game(
        &self,
        id: &str,
        form: &mut GameForm,
    ) -> Result<NormalizedResult, ClientError> {
        self.ensure_allowed(Intent::UpdateGame)?;
        let id = self.require_id(id, Precondition::MissingGameId)?;
        let request = form.to_update_request().map_err(|p| self.refuse(p))?;
        let payload = serde_json::to_value(&request)?;

        let call = Call::new(
            Intent::UpdateGame,
            Method::Patch,
            routes::game(&id),
            |reason| Message::UpdateGameFailed { reason },
        )
        .game(&id)
        .payload(payload)
        .pending(Message::UpdatingGame);
        let result = self.perform(call).await?;

        tracing::info!("Updated game {}", id);
        form.reset();
        self.refresh_games().await;
        self.notifications
            .success(self.catalog.message(&Message::GameUpdated));
        Ok(result)
    }

    /// Back up the selected game. A blank name is sent as `null`.
    pub async fn run_backup(&self, form: &mut BackupForm) -> Result<NormalizedResult, ClientError> {
        self.ensure_allowed(Intent::RunBackup)?;
        let game_id = self.require_selection()?;
        let payload = serde_json::to_value(form.to_request())?;

        let call = Call::new(
            Intent::RunBackup,
            Method::Post,
            routes::run_backup(&game_id),
            |reason| Message::BackupFailed { reason },
        )
        .game(&game_id)
        .payload(payload)
        .pending(Message::CreatingBackup);
        let result = self.perform(call).await?;

        tracing::info!("Backup created for game {}", game_id);
        form.reset();
        self.refresh_backups(&game_id).await;
        self.notifications
            .success(self.catalog.message(&Message::BackupCreated));
        Ok(result)
    }

    pub async fn restore_latest(&self) -> Result<NormalizedResult, ClientError> {
        self.ensure_allowed(Intent::RestoreLatest)?;
        let game_id = self.require_selection()?;

        let call = Call::new(
            Intent::RestoreLatest,
            Method::Post,
            routes::restore_latest(&game_id),
            |reason| Message::RestoreLatestFailed { reason },
        )
        .game(&game_id)
        .pending(Message::RestoringLatest);
        let result = self.perform(call).await?;

        tracing::info!("Restored latest backup of game {}", game_id);
        self.notifications
            .success(self.catalog.message(&Message::LatestRestored));
        Ok(result)
    }

    /// Restore a specific backup into the selected game.
    pub async fn restore_backup(&self, backup_id: &str) -> Result<NormalizedResult, ClientError> {
        self.ensure_allowed(Intent::RestoreById)?;
        let game_id = self.require_selection()?;
        let backup_id = self.require_backup_id(backup_id)?;

        let call = Call::new(
            Intent::RestoreById,
            Method::Post,
            routes::restore(&game_id, &backup_id),
            |reason| Message::RestoreBackupFailed { reason },
        )
        .game(&game_id)
        .backup(&backup_id)
        .pending(Message::RestoringBackup {
            backup_id: backup_id.to_string(),
        });
        let result = self.perform(call).await?;

        tracing::info!("Restored backup {} of game {}", backup_id, game_id);
        self.notifications
            .success(self.catalog.message(&Message::BackupRestored));
        Ok(result)
    }

    /// Delete a backup of the selected game once `confirm` agrees. The
    /// prompt text is passed to `confirm`.
    pub async fn delete_backup(
        &self,
        backup_id: &str,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<Deletion, ClientError> {
        self.ensure_allowed(Intent::DeleteBackup)?;
        let game_id = self.require_selection()?;
        let backup_id = self.require_backup_id(backup_id)?;

        if !confirm(&self.catalog.message(&Message::ConfirmDeleteBackup)) {
            tracing::debug!("Delete of backup {} declined", backup_id);
            return Ok(Deletion::Declined);
        }

        let call = Call::new(
            Intent::DeleteBackup,
            Method::Delete,
            routes::backup(&game_id, &backup_id),
            |reason| Message::DeleteBackupFailed { reason },
        )
        .game(&game_id)
        .backup(&backup_id)
        .pending(Message::DeletingBackup {
            backup_id: backup_id.to_string(),
        });
        let result = self.perform(call).await?;

        tracing::info!("Deleted backup {} of game {}", backup_id, game_id);
        self.refresh_backups(&game_id).await;
        self.notifications
            .success(self.catalog.message(&Message::BackupDeleted));
        Ok(Deletion::Deleted(result))
    }

    /// Fetch and render the selected game's backups.
    pub async fn list_backups(&self) -> Result<Vec<Backup>, ClientError> {
        self.ensure_allowed(Intent::ListBackups)?;
        let game_id = self.require_selection()?;
        self.fetch_backups(&game_id, true).await
    }

    /// Probe the server. Never raises a notification.
    pub async fn health_check(&self) -> Result<HealthStatus, ClientError> {
        self.ensure_allowed(Intent::HealthCheck)?;

        let status = match self.transport.send(Method::Get, routes::HEALTH, None).await {
            Ok(result) => {
                let status = if result.succeeded {
                    HealthStatus::Ok
                } else {
                    HealthStatus::Failing(result.status)
                };
                self.views().last_response = Some(result);
                status
            }
            Err(e) => {
                tracing::warn!("Health check failed: {}", e);
                HealthStatus::Unreachable
            }
        };

        self.views().health = status;
        Ok(status)
    }

    /// Make `game` the selected game and load its backups where this page
    /// shows them.
    pub async fn select_game(&self, game: Game) -> Result<Vec<Backup>, ClientError> {
        let id = game.id.clone();
        self.selection.set_selected(game);
        if !self.page.allows(Intent::ListBackups) {
            return Ok(Vec::new());
        }
        self.fetch_backups(&id, true).await
    }

    /// Enter a game's detail view by id: find it in the server's list,
    /// select it and load its backups. A failed backup list fails the open
    /// but keeps the selection.
    pub async fn open_game(&self, id: &str) -> Result<Game, ClientError> {
        let id = self.require_id(id, Precondition::MissingGameId)?;

        let games = match self.fetch_games(true).await {
            Ok(games) => games,
            Err(err) => {
                self.selection.clear();
                return Err(err);
            }
        };

        let Some(game) = games.into_iter().find(|g| g.id == id) else {
            self.selection.clear();
            self.views().backups.render_empty();
            return Err(self.refuse(Precondition::GameNotFound(id.to_string())));
        };

        self.selection.set_selected(game.clone());
        if self.page.allows(Intent::ListBackups) {
            self.fetch_backups(&game.id, true).await?;
        }
        Ok(game)
    }

    fn known_game(&self, id: &EntityId) -> Result<Game, ClientError> {
        let found = self
            .views()
            .game_rows
            .iter()
            .find(|g| &g.id == id)
            .cloned();
        found.ok_or_else(|| self.refuse(Precondition::GameNotFound(id.to_string())))
    }

    /// Run the intent behind a bound row button.
    pub async fn activate(
        &self,
        action: &RowAction,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<Activation, ClientError> {
        match action {
            RowAction::Select(id) => {
                let game = self.known_game(id)?;
                self.select_game(game.clone()).await?;
                Ok(Activation::Selected(game))
            }
            RowAction::Open(id) => Ok(Activation::Opened(self.open_game(id.as_str()).await?)),
            RowAction::Edit(id) => {
                let game = self.known_game(id)?;
                Ok(Activation::Editing {
                    id: id.clone(),
                    form: GameForm::from_game(&game),
                })
            }
            RowAction::Restore(id) => {
                Ok(Activation::Restored(self.restore_backup(id.as_str()).await?))
            }
            RowAction::Delete(id) => Ok(Activation::Deletion(
                self.delete_backup(id.as_str(), confirm).await?,
            )),
        }
    }

    /// Navigation away: drop the selection and everything rendered.
    pub fn leave_page(&self) {
        self.selection.clear();
        *self.views() = Views::default();
        self.notifications.hide();
    }
}
