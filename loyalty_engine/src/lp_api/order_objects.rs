use crate::db_types::Order;

/// The outcome of a successful order registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderRegistration {
    /// The order is new. It has been queued for an accrual lookup.
    Accepted(Order),
    /// The user had already registered the order.
    AlreadyRegistered(Order),
}

impl OrderRegistration {
    pub fn order(&self) -> &Order {
        match self {
            Self::Accepted(order) | Self::AlreadyRegistered(order) => order,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}
