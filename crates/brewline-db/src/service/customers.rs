//! Customer lookup and registration at the counter.

use chrono::{DateTime, Utc};
use sqlx::Database;
use tracing::info;

use brewline_core::validation::{validate_customer_name, validate_customer_number};
use brewline_core::{Customer, CustomerInput, ValidationError, CUSTOMER_ID_PREFIX};

use super::{Cafe, ServiceResult};
use crate::store::{CafeStore, CustomerStore};

impl<DB> Cafe<DB>
where
    DB: Database,
    DB::Connection: CafeStore,
{
    /// Looks a customer up by the number typed at the counter.
    pub async fn find_customer(&self, number: &str) -> ServiceResult<Option<Customer>> {
        let number = validate_customer_number(number)?;
        let mut conn = self.pool.acquire().await?;
        Ok(conn.find_customer(&number).await?)
    }

    /// Returns the existing customer for `input.number`, or registers a new
    /// one under the next `CUST-NNNN` id.
    pub async fn resolve_customer(&self, input: &CustomerInput) -> ServiceResult<Customer> {
        let mut tx = self.pool.begin().await?;
        let customer = resolve_in(&mut *tx, input, Utc::now()).await?;
        tx.commit().await?;
        Ok(customer)
    }
}

/// Resolves a customer on an open connection.
///
/// The number is required. An unknown number also needs a non-blank name.
pub(crate) async fn resolve_in<S: CustomerStore + ?Sized>(
    store: &mut S,
    input: &CustomerInput,
    at: DateTime<Utc>,
) -> ServiceResult<Customer> {
    let number = validate_customer_number(&input.number)?;

    if let Some(existing) = store.find_customer(&number).await? {
        return Ok(existing);
    }

    let name = match input.name.as_deref() {
        Some(name) => validate_customer_name(name)?,
        None => return Err(ValidationError::required("customer name").into()),
    };

    let count = store.count_customers().await?;
    let customer = Customer {
        customer_id: format!("{}-{:04}", CUSTOMER_ID_PREFIX, count + 1),
        customer_number: number,
        customer_name: name,
    };
    store.insert_customer(&customer, at).await?;

    info!(
        customer_id = %customer.customer_id,
        customer_number = %customer.customer_number,
        "Registered customer"
    );
    Ok(customer)
}

#[cfg(test)]
mod tests {
    use super::super::tests::test_cafe;
    use super::*;

    #[tokio::test]
    async fn test_new_customers_get_sequential_ids() {
        let cafe = test_cafe().await;

        let alice = cafe
            .resolve_customer(&CustomerInput::new("0300-1234567").with_name("Alice"))
            .await
            .unwrap();
        let bob = cafe
            .resolve_customer(&CustomerInput::new("0300-7654321").with_name("Bob"))
            .await
            .unwrap();

        assert_eq!(alice.customer_id, "CUST-0001");
        assert_eq!(bob.customer_id, "CUST-0002");
    }

    #[tokio::test]
    async fn test_existing_customer_returned_as_is() {
        let cafe = test_cafe().await;
        let first = cafe
            .resolve_customer(&CustomerInput::new("555").with_name("Alice"))
            .await
            .unwrap();

        // Name is ignored for a known number.
        let again = cafe
            .resolve_customer(&CustomerInput::new(" 555 ").with_name("Someone Else"))
            .await
            .unwrap();
        assert_eq!(again, first);

        let found = cafe.find_customer("555").await.unwrap();
        assert_eq!(found, Some(first));
    }

    #[tokio::test]
    async fn test_blank_number_is_validation_error() {
        let cafe = test_cafe().await;
        let err = cafe
            .resolve_customer(&CustomerInput::new("   ").with_name("Alice"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_unknown_number_without_name_is_validation_error() {
        let cafe = test_cafe().await;

        let err = cafe
            .resolve_customer(&CustomerInput::new("777"))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = cafe
            .resolve_customer(&CustomerInput::new("777").with_name("  "))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        assert_eq!(cafe.find_customer("777").await.unwrap(), None);
    }
}
