//! Table renderer.
//!
//! Turns rows plus column descriptors into a [`TableView`]. A render never
//! patches a previous view; it builds a new one, and the view carries the
//! list of row actions the host must bind for that render cycle.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::messages::{Catalog, Label};
use crate::models::{EntityId, Game};

/// How a column gets its cell contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// `row[key]`
    Field,
    /// The row's interactive affordances.
    Actions,
}

/// A column descriptor: header text plus what to extract per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub label: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn field(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: ColumnKind::Field,
        }
    }

    pub fn actions(label: impl Into<String>) -> Self {
        Self {
            key: "actions".to_string(),
            label: label.into(),
            kind: ColumnKind::Actions,
        }
    }
}

/// Per-row buttons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowAction {
    /// Make this game the selected game.
    Select(EntityId),
    /// Navigate to this game's detail page.
    Open(EntityId),
    /// Prefill the edit form with this game.
    Edit(EntityId),
    /// Restore this backup into the selected game.
    Restore(EntityId),
    /// Delete this backup after confirmation.
    Delete(EntityId),
}

impl RowAction {
    pub fn label(&self) -> Label {
        match self {
            RowAction::Select(_) => Label::Select,
            RowAction::Open(_) => Label::Open,
            RowAction::Edit(_) => Label::Edit,
            RowAction::Restore(_) => Label::Restore,
            RowAction::Delete(_) => Label::Delete,
        }
    }
}

/// One input row: a flat field map plus its actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub fields: Map<String, Value>,
    pub actions: Vec<RowAction>,
}

impl TableRow {
    /// Build a row from any serializable entity. Non-object values give an
    /// empty field map.
    pub fn from_entity<T: Serialize>(entity: &T, actions: Vec<RowAction>) -> Self {
        let fields = match serde_json::to_value(entity) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self { fields, actions }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Actions(Vec<RowAction>),
}

/// An action the host binds to the rendered row at `row`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub row: usize,
    pub action: RowAction,
}

/// The rendered surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableView {
    /// "No records." and nothing to bind.
    Placeholder,
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<Cell>>,
        bindings: Vec<Binding>,
    },
}

impl TableView {
    /// Number of body rows; zero for the placeholder.
    pub fn row_count(&self) -> usize {
        match self {
            TableView::Placeholder => 0,
            TableView::Table { rows, .. } => rows.len(),
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        match self {
            TableView::Placeholder => &[],
            TableView::Table { bindings, .. } => bindings,
        }
    }

    /// Text of the cell at (`row`, `column`), if it is a text cell.
    pub fn text_at(&self, row: usize, column: usize) -> Option<&str> {
        match self {
            TableView::Placeholder => None,
            TableView::Table { rows, .. } => match rows.get(row)?.get(column)? {
                Cell::Text(text) => Some(text.as_str()),
                Cell::Actions(_) => None,
            },
        }
    }

    /// Aligned plain text for terminal hosts.
    pub fn to_text(&self, catalog: &Catalog) -> String {
        let (headers, rows) = match self {
            TableView::Placeholder => return catalog.label(Label::NoRecords).to_string(),
            TableView::Table { headers, rows, .. } => (headers, rows),
        };

        let body: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Cell::Text(text) => text.clone(),
                        Cell::Actions(actions) => actions
                            .iter()
                            .map(|a| format!("[{}]", catalog.label(a.label())))
                            .collect::<Vec<_>>()
                            .join(" "),
                    })
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &body {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = vec![line(headers.as_slice())];
        out.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        out.extend(body.iter().map(|row| line(row.as_slice())));
        out.join("\n")
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Render rows against columns.
pub fn render(rows: &[TableRow], columns: &[Column]) -> TableView {
    if rows.is_empty() {
        return TableView::Placeholder;
    }

    let headers: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();
    let has_actions = columns.iter().any(|c| c.kind == ColumnKind::Actions);

    let mut bindings = Vec::new();
    let body: Vec<Vec<Cell>> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            if has_actions {
                bindings.extend(row.actions.iter().map(|action| Binding {
                    row: index,
                    action: action.clone(),
                }));
            }
            columns
                .iter()
                .map(|column| match column.kind {
                    ColumnKind::Field => Cell::Text(cell_text(row.fields.get(&column.key))),
                    ColumnKind::Actions => Cell::Actions(row.actions.clone()),
                })
                .collect()
        })
        .collect();

    TableView::Table {
        headers,
        rows: body,
        bindings,
    }
}

/// A named render target. Each render replaces the previous content.
#[derive(Debug, Clone, Default)]
pub struct TableSurface {
    view: Option<TableView>,
}

impl TableSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, rows: &[TableRow], columns: &[Column]) -> &TableView {
        self.view.insert(render(rows, columns))
    }

    /// Show the placeholder.
    pub fn render_empty(&mut self) -> &TableView {
        self.view.insert(TableView::Placeholder)
    }

    pub fn view(&self) -> Option<&TableView> {
        self.view.as_ref()
    }
}

/// Lines of the selected-game detail panel.
pub fn detail_lines(game: Option<&Game>, catalog: &Catalog) -> Vec<String> {
    let Some(game) = game else {
        return vec![catalog.label(Label::GameNotFound).to_string()];
    };
    let last_backup = game
        .last_backup_at
        .as_deref()
        .unwrap_or(catalog.label(Label::NoValue));
    vec![
        format!("{}: {}", catalog.label(Label::Id), game.id),
        format!("{}: {}", catalog.label(Label::Name), game.name),
        format!("{}: {}", catalog.label(Label::GamePath), game.game_path),
        format!("{}: {}", catalog.label(Label::BackupRoot), game.backup_root),
        format!("{}: {}", catalog.label(Label::LastBackup), last_backup),
        format!("[{}]", catalog.label(Label::Selected)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> TableRow {
        TableRow::from_entity(&value, Vec::new())
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::field("id", "ID"),
            Column::field("name", "Name"),
            Column::field("size_bytes", "Size"),
        ]
    }

    #[test]
    fn test_empty_rows_render_placeholder_for_any_columns() {
        assert_eq!(render(&[], &columns()), TableView::Placeholder);
        assert_eq!(render(&[], &[]), TableView::Placeholder);
        assert!(render(&[], &[Column::actions("Actions")]).bindings().is_empty());
    }

    #[test]
    fn test_one_body_row_per_input_row_in_order() {
        let rows = vec![
            row(json!({ "id": 2, "name": "b" })),
            row(json!({ "id": 1, "name": "a" })),
            row(json!({ "id": 3, "name": "c" })),
        ];
        let view = render(&rows, &columns());
        assert_eq!(view.row_count(), 3);
        assert_eq!(view.text_at(0, 0), Some("2"));
        assert_eq!(view.text_at(2, 1), Some("c"));

        let no_columns = render(&rows, &[]);
        assert_eq!(no_columns.row_count(), 3);
    }

    #[test]
    fn test_missing_and_null_fields_render_empty() {
        let rows = vec![row(json!({ "id": 1, "name": null }))];
        let view = render(&rows, &columns());
        assert_eq!(view.text_at(0, 1), Some(""));
        assert_eq!(view.text_at(0, 2), Some(""));
        let text = view.to_text(&Catalog::default());
        assert!(!text.contains("null"));
        assert!(!text.contains("undefined"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let rows = vec![TableRow::from_entity(
            &json!({ "id": 9, "name": "Elden Ring" }),
            vec![RowAction::Select(EntityId::from(9))],
        )];
        let mut cols = columns();
        cols.push(Column::actions("Actions"));

        let mut surface = TableSurface::new();
        let first = surface.render(&rows, &cols).clone();
        let second = surface.render(&rows, &cols).clone();
        assert_eq!(first, second);
        assert_eq!(first.bindings().len(), 1);
    }

    #[test]
    fn test_bindings_follow_rows() {
        let rows = vec![
            TableRow::from_entity(
                &json!({ "id": 1 }),
                vec![
                    RowAction::Restore(EntityId::from(1)),
                    RowAction::Delete(EntityId::from(1)),
                ],
            ),
            TableRow::from_entity(
                &json!({ "id": 2 }),
                vec![RowAction::Restore(EntityId::from(2))],
            ),
        ];
        let view = render(&rows, &[Column::field("id", "ID"), Column::actions("Actions")]);
        let bindings = view.bindings();
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[2].row, 1);
        assert_eq!(bindings[2].action, RowAction::Restore(EntityId::from(2)));

        // Without an actions column nothing is bound.
        let view = render(&rows, &[Column::field("id", "ID")]);
        assert!(view.bindings().is_empty());
    }

    #[test]
    fn test_to_text_layout() {
        let rows = vec![TableRow::from_entity(
            &json!({ "id": 1, "name": "Hades" }),
            vec![RowAction::Open(EntityId::from(1)), RowAction::Edit(EntityId::from(1))],
        )];
        let view = render(&rows, &[Column::field("name", "Name"), Column::actions("Actions")]);
        let text = view.to_text(&Catalog::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name   Actions");
        assert_eq!(lines[2], "Hades  [Open] [Edit]");

        assert_eq!(TableView::Placeholder.to_text(&Catalog::default()), "No records.");
    }

    #[test]
    fn test_detail_lines() {
        let game = Game {
            id: EntityId::from(4),
            name: "Hollow Knight".to_string(),
            game_path: "/saves/hk".to_string(),
            backup_root: "/backups/hk".to_string(),
            last_backup_at: None,
            created_at: None,
            updated_at: None,
        };
        let lines = detail_lines(Some(&game), &Catalog::default());
        assert_eq!(lines[0], "ID: 4");
        assert_eq!(lines[4], "Last Backup: -");
        assert_eq!(detail_lines(None, &Catalog::default()), vec!["Game not found."]);
    }
}
