//! Permission matrix evaluation and editing.
//!
//! Each user carries a [`PermissionMatrix`]: menu id → [`MenuPermissions`]. Every
//! [`Menu`] declares which [`Action`]s exist for it; anything outside that set is
//! never granted. The `supervisor` role bypasses the matrix, checked in exactly one
//! place, [`is_superuser`], consulted by [`is_allowed`].
//!
//! Evaluation fails closed and never errors: unknown menus, unknown actions and
//! missing entries all evaluate to `false`.

use crate::{
    entities::user,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use tracing::warn;

/// Role that is authorized for everything.
pub const SUPERUSER_ROLE: &str = "supervisor";

/// An action a user may perform inside a menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// See the menu at all
    View,
    /// Create records
    Create,
    /// Modify records
    Edit,
    /// Move records to the trash
    Delete,
    /// Remove uploaded files
    DeleteFiles,
    /// Bring records back from the trash
    Restore,
    /// Remove records for good
    DeletePermanent,
}

impl Action {
    /// Every action, in matrix column order.
    pub const ALL: [Self; 7] = [
        Self::View,
        Self::Create,
        Self::Edit,
        Self::Delete,
        Self::DeleteFiles,
        Self::Restore,
        Self::DeletePermanent,
    ];

    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::DeleteFiles => "delete_files",
            Self::Restore => "restore",
            Self::DeletePermanent => "delete_permanent",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation {
                message: format!("unknown action '{s}'"),
            })
    }
}

/// An application menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Menu {
    /// Overview and summary
    Dashboard,
    /// Order intake and customer data
    Orders,
    /// Production steps
    Production,
    /// Quality control
    Qc,
    /// Packing
    Packing,
    /// Shipping proofs
    Shipping,
    /// Issue notes
    Issues,
    /// Price list and calculator
    Pricing,
    /// Production type templates
    ProductionTypes,
    /// Staff accounts and permissions
    Users,
    /// Soft-deleted orders
    Trash,
}

impl Menu {
    /// Every menu, in display order.
    pub const ALL: [Self; 11] = [
        Self::Dashboard,
        Self::Orders,
        Self::Production,
        Self::Qc,
        Self::Packing,
        Self::Shipping,
        Self::Issues,
        Self::Pricing,
        Self::ProductionTypes,
        Self::Users,
        Self::Trash,
    ];

    /// Id used as the matrix key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Orders => "orders",
            Self::Production => "production",
            Self::Qc => "qc",
            Self::Packing => "packing",
            Self::Shipping => "shipping",
            Self::Issues => "issues",
            Self::Pricing => "pricing",
            Self::ProductionTypes => "production_types",
            Self::Users => "users",
            Self::Trash => "trash",
        }
    }

    /// The actions this menu declares.
    #[must_use]
    pub const fn legal_actions(self) -> &'static [Action] {
        use Action::{Create, Delete, DeleteFiles, DeletePermanent, Edit, Restore, View};
        match self {
            Self::Dashboard => &[View],
            Self::Orders => &[View, Create, Edit, Delete, DeleteFiles],
            Self::Production | Self::Qc | Self::Packing | Self::Pricing => &[View, Edit],
            Self::Shipping => &[View, Edit, DeleteFiles],
            Self::Issues | Self::ProductionTypes | Self::Users => &[View, Create, Edit, Delete],
            Self::Trash => &[View, Restore, DeletePermanent],
        }
    }

    /// Whether `action` is declared for this menu.
    #[must_use]
    pub fn declares(self, action: Action) -> bool {
        self.legal_actions().contains(&action)
    }
}

impl fmt::Display for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Menu {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|menu| menu.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation {
                message: format!("unknown menu '{s}'"),
            })
    }
}

/// The action flags of one menu.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct MenuPermissions {
    /// See the menu
    pub view: bool,
    /// Create records
    pub create: bool,
    /// Modify records
    pub edit: bool,
    /// Move records to the trash
    pub delete: bool,
    /// Remove uploaded files
    pub delete_files: bool,
    /// Restore from the trash
    pub restore: bool,
    /// Remove for good
    pub delete_permanent: bool,
}

impl MenuPermissions {
    /// Reads one flag.
    #[must_use]
    pub const fn get(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Create => self.create,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
            Action::DeleteFiles => self.delete_files,
            Action::Restore => self.restore,
            Action::DeletePermanent => self.delete_permanent,
        }
    }

    fn flag_mut(&mut self, action: Action) -> &mut bool {
        match action {
            Action::View => &mut self.view,
            Action::Create => &mut self.create,
            Action::Edit => &mut self.edit,
            Action::Delete => &mut self.delete,
            Action::DeleteFiles => &mut self.delete_files,
            Action::Restore => &mut self.restore,
            Action::DeletePermanent => &mut self.delete_permanent,
        }
    }

    /// Granted actions, in matrix column order.
    #[must_use]
    pub fn granted(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|action| self.get(*action))
            .collect()
    }
}

/// Per-user table of allowed actions, keyed by menu id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMatrix(BTreeMap<String, MenuPermissions>);

impl PermissionMatrix {
    /// An empty matrix: nothing is allowed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What new accounts start with: the dashboard and the order list.
    #[must_use]
    pub fn starter() -> Self {
        Self::new()
            .with_grant(Menu::Dashboard, Action::View)
            .with_grant(Menu::Orders, Action::View)
    }

    /// Returns a copy with `action` granted on `menu`, applying the same
    /// dependency rules as [`toggle_permission`]. Undeclared actions are ignored.
    #[must_use]
    pub fn with_grant(&self, menu: Menu, action: Action) -> Self {
        let mut next = self.clone();
        if menu.declares(action) {
            let entry = next.0.entry(menu.as_str().to_string()).or_default();
            *entry.flag_mut(action) = true;
            entry.view = true;
        }
        next
    }

    /// The entry for a menu id, if any.
    #[must_use]
    pub fn entry(&self, menu_id: &str) -> Option<&MenuPermissions> {
        self.0.get(menu_id)
    }

    /// Iterates over `(menu id, flags)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MenuPermissions)> {
        self.0.iter().map(|(menu, flags)| (menu.as_str(), flags))
    }

    /// Reads a stored matrix. A malformed document yields an empty matrix so that
    /// evaluation fails closed.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            warn!("Ignoring malformed permission matrix: {e}");
            Self::default()
        })
    }

    /// Serializes the matrix for storage.
    ///
    /// # Errors
    /// Only if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// The single superuser predicate.
#[must_use]
pub fn is_superuser(role: &str) -> bool {
    role == SUPERUSER_ROLE
}

/// Typed check: superusers pass, everyone else needs a declared and granted flag.
#[must_use]
pub fn is_allowed(role: &str, matrix: &PermissionMatrix, menu: Menu, action: Action) -> bool {
    if is_superuser(role) {
        return true;
    }
    menu.declares(action)
        && matrix
            .entry(menu.as_str())
            .is_some_and(|flags| flags.get(action))
}

/// Answers whether `role` with `matrix` may perform `action` on `menu_id`.
///
/// Unknown menus and action names evaluate to `false` for everyone but superusers.
#[must_use]
pub fn evaluate(role: &str, matrix: &PermissionMatrix, menu_id: &str, action: &str) -> bool {
    match (menu_id.parse::<Menu>(), action.parse::<Action>()) {
        (Ok(menu), Ok(action)) => is_allowed(role, matrix, menu, action),
        _ => is_superuser(role),
    }
}

/// Flips one flag and applies the dependency rules, returning a new matrix:
///
/// - turning `view` off clears every flag of that menu
/// - turning any other action on also turns `view` on
///
/// Unknown menus and undeclared actions leave the matrix unchanged.
#[must_use]
pub fn toggle_permission(matrix: &PermissionMatrix, menu_id: &str, action: &str) -> PermissionMatrix {
    let mut next = matrix.clone();
    let (Ok(menu), Ok(action)) = (menu_id.parse::<Menu>(), action.parse::<Action>()) else {
        return next;
    };
    if !menu.declares(action) {
        return next;
    }

    let entry = next.0.entry(menu.as_str().to_string()).or_default();
    let enabled = !entry.get(action);
    *entry.flag_mut(action) = enabled;

    if action == Action::View {
        if !enabled {
            *entry = MenuPermissions::default();
        }
    } else if enabled {
        entry.view = true;
    }
    next
}

/// Gate used by the service layer before a mutation.
///
/// # Errors
/// `PermissionDenied` when the user may not perform the action.
pub fn authorize(user: &user::Model, menu: Menu, action: Action) -> Result<()> {
    let matrix = PermissionMatrix::from_json(&user.permissions);
    if is_allowed(&user.role, &matrix, menu, action) {
        return Ok(());
    }
    warn!(
        user = %user.username,
        menu = %menu,
        action = %action,
        "Permission denied"
    );
    Err(Error::PermissionDenied {
        menu: menu.to_string(),
        action: action.to_string(),
    })
}
