//! User-visible strings.
//!
//! Every string the client shows goes through [`Catalog`], keyed by a
//! [`Label`] (fixed text) or a [`Message`] (text with arguments). Adding a
//! language means adding one arm per key, nothing in the orchestration
//! changes.

use std::str::FromStr;

/// Selectable display language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    #[default]
    En,
    /// 简体中文 (Simplified Chinese).
    Zh,
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Zh => write!(f, "zh"),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "zh" | "zh-cn" => Ok(Locale::Zh),
            other => Err(format!("unknown locale {}", other)),
        }
    }
}

/// Fixed text: column headers, buttons, placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Id,
    Name,
    GamePath,
    BackupRoot,
    LastBackup,
    BackupPath,
    Created,
    Size,
    Actions,
    NoRecords,
    Select,
    Open,
    Edit,
    Restore,
    Delete,
    Selected,
    NoValue,
    GameNotFound,
    HealthOk,
}

/// Text with arguments: notifications, prompts, status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    NoGameSelected,
    MissingField { field: String },
    NothingToUpdate,
    MissingGameId,
    MissingBackupId,
    InvalidId { id: String },
    IntentUnavailable { intent: String },
    GameNotFound { id: String },
    AlreadyInProgress { intent: String },
    CreatingGame,
    GameCreated,
    CreateGameFailed { reason: String },
    UpdatingGame,
    GameUpdated,
    UpdateGameFailed { reason: String },
    CreatingBackup,
    BackupCreated,
    BackupFailed { reason: String },
    RestoringLatest,
    LatestRestored,
    RestoreLatestFailed { reason: String },
    RestoringBackup { backup_id: String },
    BackupRestored,
    RestoreBackupFailed { reason: String },
    DeletingBackup { backup_id: String },
    BackupDeleted,
    DeleteBackupFailed { reason: String },
    ListGamesFailed { reason: String },
    ListBackupsFailed { reason: String },
    ConfirmDeleteBackup,
    HealthError { status: u16 },
    HealthUnreachable,
    UnknownError,
    NetworkError,
    UnexpectedResponse,
}

/// Lookup table for one locale.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    locale: Locale,
}

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn label(&self, label: Label) -> &'static str {
        match self.locale {
            Locale::En => label_en(label),
            Locale::Zh => label_zh(label),
        }
    }

    pub fn message(&self, message: &Message) -> String {
        match self.locale {
            Locale::En => message_en(message),
            Locale::Zh => message_zh(message),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Locale::En)
    }
}

fn label_en(label: Label) -> &'static str {
    match label {
        Label::Id => "ID",
        Label::Name => "Name",
        Label::GamePath => "Game Path",
        Label::BackupRoot => "Backup Root",
        Label::LastBackup => "Last Backup",
        Label::BackupPath => "Path",
        Label::Created => "Created",
        Label::Size => "Size",
        Label::Actions => "Actions",
        Label::NoRecords => "No records.",
        Label::Select => "Select",
        Label::Open => "Open",
        Label::Edit => "Edit",
        Label::Restore => "Restore",
        Label::Delete => "Delete",
        Label::Selected => "Selected",
        Label::NoValue => "-",
        Label::GameNotFound => "Game not found.",
        Label::HealthOk => "OK",
    }
}

fn label_zh(label: Label) -> &'static str {
    match label {
        Label::Id => "ID",
        Label::Name => "名称",
        Label::GamePath => "存档路径",
        Label::BackupRoot => "备份根目录",
        Label::LastBackup => "最近备份时间",
        Label::BackupPath => "备份路径",
        Label::Created => "创建时间",
        Label::Size => "大小",
        Label::Actions => "操作",
        Label::NoRecords => "暂无记录。",
        Label::Select => "选择",
        Label::Open => "打开",
        Label::Edit => "编辑",
        Label::Restore => "恢复",
        Label::Delete => "删除",
        Label::Selected => "已选择",
        Label::NoValue => "-",
        Label::GameNotFound => "未找到游戏。",
        Label::HealthOk => "正常",
    }
}

fn message_en(message: &Message) -> String {
    match message {
        Message::NoGameSelected => "Select a game first.".to_string(),
        Message::MissingField { field } => format!("{} is required.", field),
        Message::NothingToUpdate => "No fields to update.".to_string(),
        Message::MissingGameId => "Missing game id.".to_string(),
        Message::MissingBackupId => "Missing backup id.".to_string(),
        Message::InvalidId { id } => format!("Invalid id {:?}.", id),
        Message::IntentUnavailable { intent } => {
            format!("{} is not available on this page.", intent)
        }
        Message::GameNotFound { id } => format!("Game {} not found.", id),
        Message::AlreadyInProgress { intent } => format!("{} is already in progress.", intent),
        Message::CreatingGame => "Creating game...".to_string(),
        Message::GameCreated => "Game created.".to_string(),
        Message::CreateGameFailed { reason } => format!("Create failed: {}", reason),
        Message::UpdatingGame => "Updating game...".to_string(),
        Message::GameUpdated => "Game updated.".to_string(),
        Message::UpdateGameFailed { reason } => format!("Update failed: {}", reason),
        Message::CreatingBackup => "Creating backup...".to_string(),
        Message::BackupCreated => "Backup created.".to_string(),
        Message::BackupFailed { reason } => format!("Backup failed: {}", reason),
        Message::RestoringLatest => "Restoring latest backup...".to_string(),
        Message::LatestRestored => "Latest backup restored.".to_string(),
        Message::RestoreLatestFailed { reason } => {
            format!("Restoring latest backup failed: {}", reason)
        }
        Message::RestoringBackup { backup_id } => format!("Restoring backup {}...", backup_id),
        Message::BackupRestored => "Backup restored.".to_string(),
        Message::RestoreBackupFailed { reason } => format!("Restore failed: {}", reason),
        Message::DeletingBackup { backup_id } => format!("Deleting backup {}...", backup_id),
        Message::BackupDeleted => "Backup deleted.".to_string(),
        Message::DeleteBackupFailed { reason } => format!("Delete failed: {}", reason),
        Message::ListGamesFailed { reason } => format!("Loading games failed: {}", reason),
        Message::ListBackupsFailed { reason } => format!("Loading backups failed: {}", reason),
        Message::ConfirmDeleteBackup => {
            "Delete this backup? Both the backup files and the record will be removed."
                .to_string()
        }
        Message::HealthError { status } => format!("ERR {}", status),
        Message::HealthUnreachable => "ERR unreachable".to_string(),
        Message::UnknownError => "unknown error".to_string(),
        Message::NetworkError => "network error".to_string(),
        Message::UnexpectedResponse => "unexpected response".to_string(),
    }
}

fn message_zh(message: &Message) -> String {
    match message {
        Message::NoGameSelected => "未选择游戏。".to_string(),
        Message::MissingField { field } => format!("{} 为必填项。", field),
        Message::NothingToUpdate => "没有需要更新的字段。".to_string(),
        Message::MissingGameId => "缺少游戏 ID。".to_string(),
        Message::MissingBackupId => "缺少备份 ID。".to_string(),
        Message::InvalidId { id } => format!("无效的 ID：{:?}。", id),
        Message::IntentUnavailable { intent } => format!("当前页面不支持{}。", intent),
        Message::GameNotFound { id } => format!("未找到游戏 {}。", id),
        Message::AlreadyInProgress { intent } => format!("{}正在进行中。", intent),
        Message::CreatingGame => "正在创建游戏...".to_string(),
        Message::GameCreated => "游戏创建成功！".to_string(),
        Message::CreateGameFailed { reason } => format!("创建失败：{}", reason),
        Message::UpdatingGame => "正在更新游戏...".to_string(),
        Message::GameUpdated => "游戏更新成功！".to_string(),
        Message::UpdateGameFailed { reason } => format!("更新失败：{}", reason),
        Message::CreatingBackup => "正在创建备份...".to_string(),
        Message::BackupCreated => "备份创建成功！".to_string(),
        Message::BackupFailed { reason } => format!("备份失败：{}", reason),
        Message::RestoringLatest => "正在恢复最新备份...".to_string(),
        Message::LatestRestored => "最新备份恢复成功！".to_string(),
        Message::RestoreLatestFailed { reason } => format!("恢复最新备份失败：{}", reason),
        Message::RestoringBackup { backup_id } => format!("正在恢复备份 ID：{}...", backup_id),
        Message::BackupRestored => "备份恢复成功！".to_string(),
        Message::RestoreBackupFailed { reason } => format!("恢复备份失败：{}", reason),
        Message::DeletingBackup { backup_id } => format!("正在删除备份 ID：{}...", backup_id),
        Message::BackupDeleted => "备份已删除。".to_string(),
        Message::DeleteBackupFailed { reason } => format!("删除失败：{}", reason),
        Message::ListGamesFailed { reason } => format!("加载游戏列表失败：{}", reason),
        Message::ListBackupsFailed { reason } => format!("加载备份列表失败：{}", reason),
        Message::ConfirmDeleteBackup => "确认删除该备份？将同时删除备份文件与记录。".to_string(),
        Message::HealthError { status } => format!("ERR {}", status),
        Message::HealthUnreachable => "ERR 无法连接".to_string(),
        Message::UnknownError => "未知错误".to_string(),
        Message::NetworkError => "网络错误".to_string(),
        Message::UnexpectedResponse => "响应格式异常".to_string(),
    }
}
