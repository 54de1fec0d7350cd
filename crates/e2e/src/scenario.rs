//! End-to-end scenarios
//!
//! Each scenario is a fixed sequence of page-object calls. Every step is
//! awaited before the next one starts, the first failure aborts the
//! scenario, and a checkpoint is recorded after each step.

use std::future::Future;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::checkpoint::{Attachment, StepObserver};
use crate::error::{E2eError, E2eResult};
use crate::order::{DeleteOutcome, OrderId};
use crate::page::BrowserPage;
use crate::pages::{BaseActions, ShoppingActions};
use crate::testdata::TestData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Checkout with coupon and country, then confirm the order
    ProductCheckout,
    /// Place an order and locate it in the order history
    FindOrder,
    /// Place an order and delete it from the order history
    DeleteOrder,
}

impl Scenario {
    pub fn all() -> [Scenario; 3] {
        [Scenario::ProductCheckout, Scenario::FindOrder, Scenario::DeleteOrder]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::ProductCheckout => "Product Checkout",
            Scenario::FindOrder => "Check order in Order Page",
            Scenario::DeleteOrder => "Delete order from Order Page",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Scenario::ProductCheckout => "product-checkout",
            Scenario::FindOrder => "find-order",
            Scenario::DeleteOrder => "delete-order",
        }
    }

    /// Key of the product this scenario buys in [`TestData::products`].
    pub fn product_key(&self) -> &'static str {
        match self {
            Scenario::ProductCheckout => "zaraCoat",
            Scenario::FindOrder | Scenario::DeleteOrder => "iPhone",
        }
    }

    pub async fn run<C>(&self, client: &C, data: &TestData, ctx: &mut ScenarioContext<'_>) -> E2eResult<()>
    where
        C: BaseActions + ShoppingActions,
    {
        let product = data.product(self.product_key())?;
        match self {
            Scenario::ProductCheckout => product_checkout(client, data, product, ctx).await,
            Scenario::FindOrder => find_order(client, data, product, ctx).await,
            Scenario::DeleteOrder => delete_order(client, data, product, ctx).await,
        }
    }
}

/// Outcome of one scenario step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Step runner for one scenario run.
pub struct ScenarioContext<'a> {
    page: &'a dyn BrowserPage,
    observer: &'a dyn StepObserver,
    steps: Vec<StepResult>,
    attachments: Vec<Attachment>,
    order_id: Option<OrderId>,
}

impl<'a> ScenarioContext<'a> {
    pub fn new(page: &'a dyn BrowserPage, observer: &'a dyn StepObserver) -> Self {
        Self {
            page,
            observer,
            steps: Vec::new(),
            attachments: Vec::new(),
            order_id: None,
        }
    }

    /// Run one named step to completion and record its outcome.
    ///
    /// A failing step still gets a `failed-<step>` checkpoint before the
    /// error is returned.
    pub async fn step<T, F>(&mut self, name: &str, action: F) -> E2eResult<T>
    where
        F: Future<Output = E2eResult<T>>,
    {
        debug!("Step: {}", name);
        let start = Instant::now();
        let result = action.await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => {
                info!("  ✓ {} ({} ms)", name, duration_ms);
                self.steps.push(StepResult {
                    name: name.to_string(),
                    success: true,
                    duration_ms,
                    error: None,
                });
            }
            Err(e) => {
                error!("  ✗ {} - {}", name, e);
                self.steps.push(StepResult {
                    name: name.to_string(),
                    success: false,
                    duration_ms,
                    error: Some(e.to_string()),
                });
                self.checkpoint(&format!("failed-{}", slugify(name))).await;
            }
        }

        result
    }

    /// Hand the current page to the observer.
    pub async fn checkpoint(&mut self, name: &str) {
        match self.observer.checkpoint(name, self.page).await {
            Ok(attachment) => self.attachments.push(attachment),
            Err(e) => warn!("Checkpoint '{}' not captured: {}", name, e),
        }
    }

    pub fn record_order_id(&mut self, order_id: &OrderId) {
        self.order_id = Some(order_id.clone());
    }

    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn order_id(&self) -> Option<&OrderId> {
        self.order_id.as_ref()
    }

    pub fn into_parts(self) -> (Vec<StepResult>, Vec<Attachment>, Option<OrderId>) {
        (self.steps, self.attachments, self.order_id)
    }
}

fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Steps shared by every scenario: from the login page up to a placed order.
async fn place_order<C>(client: &C, data: &TestData, product: &str, ctx: &mut ScenarioContext<'_>) -> E2eResult<()>
where
    C: BaseActions + ShoppingActions,
{
    ctx.step("Launch login page", client.launch_site(&data.application_url))
        .await?;
    ctx.checkpoint("01-login-page").await;

    let credentials = &data.login_credentials;
    ctx.step("Login to application", client.login(&credentials.email, &credentials.password))
        .await?;
    ctx.checkpoint("02-after-login").await;

    ctx.step("Add product to cart", async {
        client.add_product_to_cart(product).await?;
        client.verify_product_added_toast().await
    })
    .await?;
    ctx.checkpoint("03-product-added-to-cart").await;

    ctx.step("Verify product in cart", async {
        client.go_to_cart().await?;
        client.verify_cart_product(product).await
    })
    .await?;
    ctx.checkpoint("04-cart-verified").await;

    let payment = &data.payment_details;
    ctx.step("Fill payment details", async {
        client.proceed_to_checkout().await?;
        client.fill_card_details(&payment.cvv, &payment.cardholder_name).await
    })
    .await?;
    ctx.checkpoint("05-payment-details-filled").await;

    ctx.step("Apply coupon code", async {
        client.apply_coupon(&data.coupon_code).await?;
        client.verify_coupon_applied().await
    })
    .await?;
    ctx.checkpoint("06-coupon-applied").await;

    ctx.step("Select country", client.select_country(&data.country))
        .await?;
    ctx.checkpoint("07-country-selected").await;

    ctx.step("Place order", client.place_order()).await?;
    ctx.checkpoint("08-order-placed").await;

    Ok(())
}

/// Confirm the order shows `product` and capture its id.
async fn confirm_and_capture_id<C>(client: &C, product: &str, ctx: &mut ScenarioContext<'_>) -> E2eResult<OrderId>
where
    C: BaseActions + ShoppingActions,
{
    let order_id = ctx
        .step("Verify order confirmation and get Order ID", async {
            client.verify_order_confirmation(product).await?;
            client.get_order_id().await?.ok_or(E2eError::OrderIdMissing)
        })
        .await?;
    ctx.record_order_id(&order_id);
    ctx.checkpoint("09-order-confirmed").await;

    ctx.step("Navigate to orders page", async {
        client.go_to_orders_page().await?;
        client.wait_for_order_rows().await
    })
    .await?;
    ctx.checkpoint("10-orders-page").await;

    Ok(order_id)
}

async fn product_checkout<C>(client: &C, data: &TestData, product: &str, ctx: &mut ScenarioContext<'_>) -> E2eResult<()>
where
    C: BaseActions + ShoppingActions,
{
    place_order(client, data, product, ctx).await?;

    ctx.step(
        "Verify order confirmation",
        client.verify_order_confirmation(&data.order_confirmation_product),
    )
    .await?;
    ctx.checkpoint("09-order-confirmed").await;

    ctx.step("Sign out", client.sign_out()).await?;
    ctx.checkpoint("10-signed-out").await;

    Ok(())
}

async fn find_order<C>(client: &C, data: &TestData, product: &str, ctx: &mut ScenarioContext<'_>) -> E2eResult<()>
where
    C: BaseActions + ShoppingActions,
{
    place_order(client, data, product, ctx).await?;
    let order_id = confirm_and_capture_id(client, product, ctx).await?;

    ctx.step("Find order in table", async {
        let row = client
            .find_order_row(&order_id)
            .await?
            .ok_or_else(|| E2eError::OrderNotFound(order_id.to_string()))?;
        if row.mentions(product) {
            Ok(())
        } else {
            Err(E2eError::mismatch(
                format!("order row {}", row.index),
                product,
                Some(row.text.trim()),
            ))
        }
    })
    .await?;
    ctx.checkpoint("11-order-found").await;

    ctx.step("Sign out", client.sign_out()).await?;
    ctx.checkpoint("12-signed-out").await;

    Ok(())
}

async fn delete_order<C>(client: &C, data: &TestData, product: &str, ctx: &mut ScenarioContext<'_>) -> E2eResult<()>
where
    C: BaseActions + ShoppingActions,
{
    place_order(client, data, product, ctx).await?;
    let order_id = confirm_and_capture_id(client, product, ctx).await?;

    ctx.step("Find order in table and delete", async {
        match client.delete_order_from_table(&order_id).await? {
            DeleteOutcome::Deleted(_) => client.verify_order_deleted_toast().await,
            DeleteOutcome::NotFound => Err(E2eError::OrderNotFound(order_id.to_string())),
        }
    })
    .await?;
    ctx.checkpoint("11-order-deleted").await;

    ctx.step("Sign out", client.sign_out()).await?;
    ctx.checkpoint("12-signed-out").await;

    Ok(())
}
