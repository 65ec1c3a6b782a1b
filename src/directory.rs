//! Account directory
//!
//! Customer and account records, kept outside the ledger. The ledger only
//! stores account UUIDs; rank lookups, ownership checks, and account
//! resolution are synchronous lookups against this directory, which stands
//! at the boundary of the (external) customer-management system.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer rank, controls loan eligibility and accrual tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerRank {
    Base,
    Silver,
    Gold,
}

impl CustomerRank {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerRank::Base => "Base",
            CustomerRank::Silver => "Silver",
            CustomerRank::Gold => "Gold",
        }
    }

    /// Only Silver and Gold customers may take loans.
    #[inline]
    pub fn may_borrow(&self) -> bool {
        matches!(self, CustomerRank::Silver | CustomerRank::Gold)
    }
}

impl fmt::Display for CustomerRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: Uuid,
    pub email: String,
    pub rank: CustomerRank,
}

/// An account holds no balance field; balances are always derived from the
/// ledger log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: Uuid,
    pub account_name: String,
    pub customer_id: Uuid,
}

/// In-memory directory of customers and accounts.
#[derive(Default)]
pub struct AccountDirectory {
    customers: RwLock<HashMap<Uuid, Customer>>,
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_customer(&self, email: impl Into<String>, rank: CustomerRank) -> Customer {
        let customer = Customer {
            customer_id: Uuid::new_v4(),
            email: email.into(),
            rank,
        };
        self.customers
            .write()
            .expect("directory lock poisoned")
            .insert(customer.customer_id, customer.clone());
        customer
    }

    /// Register a customer with a fixed id (the bank's own identity from
    /// config is seeded this way at startup).
    pub fn add_customer_with_id(
        &self,
        customer_id: Uuid,
        email: impl Into<String>,
        rank: CustomerRank,
    ) -> Customer {
        let customer = Customer {
            customer_id,
            email: email.into(),
            rank,
        };
        self.customers
            .write()
            .expect("directory lock poisoned")
            .insert(customer_id, customer.clone());
        customer
    }

    pub fn add_account(&self, customer_id: Uuid, account_name: impl Into<String>) -> Account {
        self.add_account_with_id(Uuid::new_v4(), customer_id, account_name)
    }

    pub fn add_account_with_id(
        &self,
        account_id: Uuid,
        customer_id: Uuid,
        account_name: impl Into<String>,
    ) -> Account {
        let account = Account {
            account_id,
            account_name: account_name.into(),
            customer_id,
        };
        self.accounts
            .write()
            .expect("directory lock poisoned")
            .insert(account_id, account.clone());
        account
    }

    pub fn resolve_account(&self, account_id: Uuid) -> Option<Account> {
        self.accounts
            .read()
            .expect("directory lock poisoned")
            .get(&account_id)
            .cloned()
    }

    pub fn resolve_customer(&self, customer_id: Uuid) -> Option<Customer> {
        self.customers
            .read()
            .expect("directory lock poisoned")
            .get(&customer_id)
            .cloned()
    }

    /// Does `account_id` belong to `customer_id`?
    pub fn owns_account(&self, customer_id: Uuid, account_id: Uuid) -> bool {
        self.resolve_account(account_id)
            .is_some_and(|a| a.customer_id == customer_id)
    }

    pub fn rank_of(&self, customer_id: Uuid) -> Option<CustomerRank> {
        self.resolve_customer(customer_id).map(|c| c.rank)
    }

    pub fn accounts_of(&self, customer_id: Uuid) -> Vec<Account> {
        self.accounts
            .read()
            .expect("directory lock poisoned")
            .values()
            .filter(|a| a.customer_id == customer_id)
            .cloned()
            .collect()
    }
}
