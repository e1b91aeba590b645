//! Row-scoped action menus. Actions hand the row to caller callbacks and
//! never touch table state.
use std::fmt;
use std::sync::Arc;

use derive_more::Display;
use tracing::debug;

pub type RowCallback<R> = Arc<dyn Fn(&R) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ActionKind {
    #[display("view")]
    View,
    #[display("edit")]
    Edit,
    #[display("delete")]
    Delete,
    /// Index into the custom actions, in registration order.
    #[display("custom #{_0}")]
    Custom(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ActionTone {
    #[default]
    #[display("normal")]
    Normal,
    /// Rendered distinctly. Confirmation is up to the callback's owner.
    #[display("destructive")]
    Destructive,
}

/// One rendered menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionItem {
    pub kind: ActionKind,
    pub label: String,
    pub icon: Option<String>,
    pub tone: ActionTone,
}

struct CustomAction<R> {
    label: String,
    icon: Option<String>,
    callback: RowCallback<R>,
}

impl<R> Clone for CustomAction<R> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            icon: self.icon.clone(),
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Describes which actions a table offers per row. Menus list view, edit,
/// custom actions in registration order and finally delete.
pub struct ActionMenuFactory<R> {
    view: Option<RowCallback<R>>,
    edit: Option<RowCallback<R>>,
    delete: Option<RowCallback<R>>,
    custom: Vec<CustomAction<R>>,
}

impl<R> Default for ActionMenuFactory<R> {
    fn default() -> Self {
        Self {
            view: None,
            edit: None,
            delete: None,
            custom: vec![],
        }
    }
}

impl<R> Clone for ActionMenuFactory<R> {
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
            edit: self.edit.clone(),
            delete: self.delete.clone(),
            custom: self.custom.clone(),
        }
    }
}

impl<R> fmt::Debug for ActionMenuFactory<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items()).finish()
    }
}

impl<R> ActionMenuFactory<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_view(mut self, callback: impl Fn(&R) + Send + Sync + 'static) -> Self {
        self.view = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_edit(mut self, callback: impl Fn(&R) + Send + Sync + 'static) -> Self {
        self.edit = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_delete(mut self, callback: impl Fn(&R) + Send + Sync + 'static) -> Self {
        self.delete = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn custom_action(
        mut self,
        label: impl Into<String>,
        icon: Option<&str>,
        callback: impl Fn(&R) + Send + Sync + 'static,
    ) -> Self {
        self.custom.push(CustomAction {
            label: label.into(),
            icon: icon.map(ToString::to_string),
            callback: Arc::new(callback),
        });
        self
    }

    /// True when no action is configured and the menu column can be omitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.view.is_none() && self.edit.is_none() && self.delete.is_none() && self.custom.is_empty()
    }

    pub fn items(&self) -> Vec<ActionItem> {
        let builtin = |kind, label: &str, icon: &str, tone| ActionItem {
            kind,
            label: label.to_string(),
            icon: Some(icon.to_string()),
            tone,
        };

        let mut items = vec![];
        if self.view.is_some() {
            items.push(builtin(ActionKind::View, "View details", "eye", ActionTone::Normal));
        }
        if self.edit.is_some() {
            items.push(builtin(ActionKind::Edit, "Edit", "pencil", ActionTone::Normal));
        }
        items.extend(self.custom.iter().enumerate().map(|(index, action)| ActionItem {
            kind: ActionKind::Custom(index),
            label: action.label.clone(),
            icon: action.icon.clone(),
            tone: ActionTone::Normal,
        }));
        if self.delete.is_some() {
            items.push(builtin(
                ActionKind::Delete,
                "Delete",
                "trash",
                ActionTone::Destructive,
            ));
        }
        items
    }

    fn callback(&self, kind: ActionKind) -> Option<&RowCallback<R>> {
        match kind {
            ActionKind::View => self.view.as_ref(),
            ActionKind::Edit => self.edit.as_ref(),
            ActionKind::Delete => self.delete.as_ref(),
            ActionKind::Custom(index) => self.custom.get(index).map(|action| &action.callback),
        }
    }

    /// Binds the actions to one row.
    pub fn build<'a>(&'a self, row: &'a R) -> RowActionMenu<'a, R> {
        RowActionMenu { factory: self, row }
    }
}

/// The action menu of a single row.
pub struct RowActionMenu<'a, R> {
    factory: &'a ActionMenuFactory<R>,
    row: &'a R,
}

impl<R> RowActionMenu<'_, R> {
    pub fn items(&self) -> Vec<ActionItem> {
        self.factory.items()
    }

    pub fn row(&self) -> &R {
        self.row
    }

    /// Runs the callback for `kind` with the full row. Returns false when the
    /// action is not configured.
    pub fn invoke(&self, kind: ActionKind) -> bool {
        match self.factory.callback(kind) {
            Some(callback) => {
                callback(self.row);
                true
            }
            None => {
                debug!("No {kind} action configured");
                false
            }
        }
    }
}
