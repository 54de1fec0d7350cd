//! Actions valid on any page of the storefront

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::E2eResult;
use crate::locator::LoadState;
use crate::order::OrderId;
use crate::page::BrowserPage;

use super::client::StoreClient;
use super::selectors;

#[async_trait]
pub trait BaseActions: Send + Sync {
    /// Navigate to `url` and wait for the load event.
    async fn launch_site(&self, url: &str) -> E2eResult<()>;

    /// Fill the login form and submit it. Whether the credentials were
    /// accepted is left to the caller's next check.
    async fn login(&self, email: &str, password: &str) -> E2eResult<()>;

    /// Normalized order id from the confirmation label, `None` when the
    /// label is not on the page or holds no text.
    async fn get_order_id(&self) -> E2eResult<Option<OrderId>>;

    async fn sign_out(&self) -> E2eResult<()>;
}

#[async_trait]
impl<P: BrowserPage> BaseActions for StoreClient<P> {
    async fn launch_site(&self, url: &str) -> E2eResult<()> {
        info!("Launching {}", url);
        self.page().goto(url).await?;
        self.page().wait_for_load_state(LoadState::Load).await
    }

    async fn login(&self, email: &str, password: &str) -> E2eResult<()> {
        debug!("Logging in as {}", email);
        let page = self.page();

        let email_input = selectors::email_input();
        page.click(&email_input).await?;
        page.fill(&email_input, email).await?;

        let password_input = selectors::password_input();
        page.click(&password_input).await?;
        page.fill(&password_input, password).await?;

        page.click(&selectors::login_button()).await?;
        page.wait_for_load_state(LoadState::Load).await
    }

    async fn get_order_id(&self) -> E2eResult<Option<OrderId>> {
        let label = selectors::order_id_label();
        if self.page().count(&label).await? == 0 {
            debug!("Order id label not present");
            return Ok(None);
        }
        let raw = self.page().text_content(&label).await?;
        let order_id = raw.as_deref().and_then(OrderId::from_label);
        match &order_id {
            Some(id) => info!("Order ID: {}", id),
            None => debug!("Order id label empty: {:?}", raw),
        }
        Ok(order_id)
    }

    async fn sign_out(&self) -> E2eResult<()> {
        self.page().click(&selectors::sign_out_button()).await
    }
}
