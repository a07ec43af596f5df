//! Staff roles and the app module each one lands on.
//!
//! The POS app routes a signed-in employee to a module set based on the
//! `role` string in their profile. The mapping lives in one exhaustive
//! table ([`Role::home_module`]) so adding a role forces a routing decision.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// Backend security role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Tenant administrator.
    Admin,
    /// Pharmacist; may dispense controlled drugs.
    Pharmacist,
    /// Counter seller.
    Seller,
    /// Warehouse operator.
    WarehouseOp,
    /// Finance.
    Accountant,
    /// Human resources manager.
    HrManager,
    /// Logistics dispatcher.
    Dispatcher,
    /// Delivery driver.
    Driver,
    /// B2B sales executive.
    SalesExec,
    /// Compounding lab technician.
    LabTechnician,
}

/// Top-level module of the POS app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    /// Point of sale.
    Pos,
    /// Warehouse picking and stock.
    Wms,
    /// Payroll and commission self-service.
    Hr,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Admin,
        Self::Pharmacist,
        Self::Seller,
        Self::WarehouseOp,
        Self::Accountant,
        Self::HrManager,
        Self::Dispatcher,
        Self::Driver,
        Self::SalesExec,
        Self::LabTechnician,
    ];

    /// The module a user with this role lands on after sign-in.
    #[must_use]
    pub const fn home_module(self) -> Module {
        match self {
            Self::Seller | Self::Pharmacist => Module::Pos,
            Self::WarehouseOp => Module::Wms,
            Self::HrManager => Module::Hr,
            Self::Admin
            | Self::Accountant
            | Self::Dispatcher
            | Self::Driver
            | Self::SalesExec
            | Self::LabTechnician => Module::Pos,
        }
    }

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Pharmacist => "PHARMACIST",
            Self::Seller => "SELLER",
            Self::WarehouseOp => "WAREHOUSE_OP",
            Self::Accountant => "ACCOUNTANT",
            Self::HrManager => "HR_MANAGER",
            Self::Dispatcher => "DISPATCHER",
            Self::Driver => "DRIVER",
            Self::SalesExec => "SALES_EXEC",
            Self::LabTechnician => "LAB_TECHNICIAN",
        }
    }
}

impl Module {
    /// Route path of the module's entry screen.
    #[must_use]
    pub const fn route(self) -> &'static str {
        match self {
            Self::Pos => "/(pos)",
            Self::Wms => "/(wms)",
            Self::Hr => "/(hr)",
        }
    }

    /// Module for a raw role string; unrecognised roles land on the POS.
    #[must_use]
    pub fn for_role_name(role: &str) -> Self {
        role.parse::<Role>().map_or(Self::Pos, Role::home_module)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let name = trimmed.strip_prefix("ROLE_").unwrap_or(trimmed);
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| RoleParseError(s.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_home_module_table() {
        assert_eq!(Role::Seller.home_module(), Module::Pos);
        assert_eq!(Role::Pharmacist.home_module(), Module::Pos);
        assert_eq!(Role::WarehouseOp.home_module(), Module::Wms);
        assert_eq!(Role::HrManager.home_module(), Module::Hr);
        assert_eq!(Role::Driver.home_module(), Module::Pos);
    }

    #[test]
    fn test_parse_round_trips_every_role() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_parse_accepts_spring_prefix() {
        assert_eq!("ROLE_HR_MANAGER".parse::<Role>().unwrap(), Role::HrManager);
    }

    #[test]
    fn test_unknown_role_lands_on_pos() {
        assert!("JANITOR".parse::<Role>().is_err());
        assert_eq!(Module::for_role_name("JANITOR"), Module::Pos);
        assert_eq!(Module::for_role_name("WAREHOUSE_OP"), Module::Wms);
    }

    #[test]
    fn test_routes() {
        assert_eq!(Module::Hr.route(), "/(hr)");
    }
}
