//! Shopping, checkout and order-history actions

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::locator::{LoadState, WaitState};
use crate::order::{DeleteOutcome, OrderId, OrderRow};
use crate::page::BrowserPage;

use super::client::StoreClient;
use super::selectors;

#[async_trait]
pub trait ShoppingActions: Send + Sync {
    /// Click "Add to Cart" on the card titled exactly `product`.
    async fn add_product_to_cart(&self, product: &str) -> E2eResult<()>;

    async fn verify_product_added_toast(&self) -> E2eResult<()>;

    async fn go_to_cart(&self) -> E2eResult<()>;

    async fn get_cart_product_name(&self) -> E2eResult<Option<String>>;

    /// Fails unless the cart title equals `expected`. Read-only.
    async fn verify_cart_product(&self, expected: &str) -> E2eResult<()>;

    async fn proceed_to_checkout(&self) -> E2eResult<()>;

    async fn fill_card_details(&self, cvv: &str, cardholder_name: &str) -> E2eResult<()>;

    async fn apply_coupon(&self, code: &str) -> E2eResult<()>;

    async fn verify_coupon_applied(&self) -> E2eResult<()>;

    /// Type into the country typeahead and pick the exact suggestion once
    /// the results panel has rendered.
    async fn select_country(&self, country: &str) -> E2eResult<()>;

    async fn place_order(&self) -> E2eResult<()>;

    async fn verify_order_confirmation(&self, expected_product: &str) -> E2eResult<()>;

    async fn go_to_orders_page(&self) -> E2eResult<()>;

    /// Wait until the order table has rendered at least one row.
    async fn wait_for_order_rows(&self) -> E2eResult<()>;

    /// First row, in document order, whose identifier cell matches `order_id`.
    async fn find_order_row(&self, order_id: &OrderId) -> E2eResult<Option<OrderRow>>;

    async fn find_order_in_table(&self, order_id: &OrderId) -> E2eResult<bool> {
        Ok(self.find_order_row(order_id).await?.is_some())
    }

    /// Delete the first matching row. A miss touches nothing and is
    /// reported as [`DeleteOutcome::NotFound`].
    async fn delete_order_from_table(&self, order_id: &OrderId) -> E2eResult<DeleteOutcome>;

    async fn verify_order_deleted_toast(&self) -> E2eResult<()>;
}

#[async_trait]
impl<P: BrowserPage> ShoppingActions for StoreClient<P> {
    async fn add_product_to_cart(&self, product: &str) -> E2eResult<()> {
        debug!("Adding {} to cart", product);
        self.page().click(&selectors::add_to_cart_button(product)).await
    }

    async fn verify_product_added_toast(&self) -> E2eResult<()> {
        self.expect()
            .visible(self.page(), &selectors::product_added_toast())
            .await
    }

    async fn go_to_cart(&self) -> E2eResult<()> {
        self.page().click(&selectors::cart_button()).await
    }

    async fn get_cart_product_name(&self) -> E2eResult<Option<String>> {
        self.page().text_content(&selectors::cart_product_title()).await
    }

    async fn verify_cart_product(&self, expected: &str) -> E2eResult<()> {
        let actual = self.get_cart_product_name().await?;
        if actual.as_deref() == Some(expected) {
            Ok(())
        } else {
            Err(E2eError::mismatch("cart product", expected, actual.as_deref()))
        }
    }

    async fn proceed_to_checkout(&self) -> E2eResult<()> {
        self.page().click(&selectors::checkout_button()).await
    }

    async fn fill_card_details(&self, cvv: &str, cardholder_name: &str) -> E2eResult<()> {
        let page = self.page();

        let cvv_input = selectors::cvv_input();
        page.click(&cvv_input).await?;
        page.fill(&cvv_input, cvv).await?;

        let name_input = selectors::cardholder_input();
        page.click(&name_input).await?;
        page.fill(&name_input, cardholder_name).await
    }

    async fn apply_coupon(&self, code: &str) -> E2eResult<()> {
        let page = self.page();
        let coupon_input = selectors::coupon_input();
        page.click(&coupon_input).await?;
        page.fill(&coupon_input, code).await?;
        page.click(&selectors::apply_coupon_button()).await
    }

    async fn verify_coupon_applied(&self) -> E2eResult<()> {
        self.expect()
            .visible(self.page(), &selectors::coupon_applied_text())
            .await
    }

    async fn select_country(&self, country: &str) -> E2eResult<()> {
        let page = self.page();
        let input = selectors::country_input();
        page.click(&input).await?;
        page.press_sequentially(&input, country, self.timeouts().typing_delay)
            .await?;

        // Suggestions arrive asynchronously; picking before the panel
        // renders clicks a stale or missing option.
        page.wait_for(&selectors::country_results(), WaitState::Visible, self.timeouts().action)
            .await?;
        page.click(&selectors::country_option(country)).await
    }

    async fn place_order(&self) -> E2eResult<()> {
        self.page().click(&selectors::place_order_button()).await?;
        self.page().wait_for_load_state(LoadState::Load).await
    }

    async fn verify_order_confirmation(&self, expected_product: &str) -> E2eResult<()> {
        let expect = self.expect();
        expect
            .visible(self.page(), &selectors::confirmation_heading())
            .await?;
        expect
            .contains_text(self.page(), &selectors::confirmation_line_item_title(), expected_product)
            .await
    }

    async fn go_to_orders_page(&self) -> E2eResult<()> {
        self.page().click(&selectors::orders_button()).await?;
        self.page().wait_for_load_state(LoadState::Load).await
    }

    async fn wait_for_order_rows(&self) -> E2eResult<()> {
        self.page()
            .wait_for(&selectors::order_row(0), WaitState::Attached, self.timeouts().action)
            .await
    }

    async fn find_order_row(&self, order_id: &OrderId) -> E2eResult<Option<OrderRow>> {
        let page = self.page();
        let count = page.count(&selectors::order_rows()).await?;
        debug!("Scanning {} order row(s) for {}", count, order_id);

        for index in 0..count {
            let Some(cell) = page.text_content(&selectors::order_row_id_cell(index)).await? else {
                continue;
            };
            if order_id.matches_cell(&cell) {
                info!("Order ID matched: {}", cell.trim());
                let text = page
                    .text_content(&selectors::order_row(index))
                    .await?
                    .unwrap_or_default();
                return Ok(Some(OrderRow {
                    index,
                    order_id: cell.trim().to_string(),
                    text,
                }));
            }
            debug!("Order ID not matched: {}", cell.trim());
        }

        Ok(None)
    }

    async fn delete_order_from_table(&self, order_id: &OrderId) -> E2eResult<DeleteOutcome> {
        match self.find_order_row(order_id).await? {
            Some(row) => {
                self.page().click(&row.delete_button()).await?;
                info!("Order ID matched and deleted: {}", row.order_id);
                Ok(DeleteOutcome::Deleted(row))
            }
            None => {
                info!("Order {} not present, nothing deleted", order_id);
                Ok(DeleteOutcome::NotFound)
            }
        }
    }

    async fn verify_order_deleted_toast(&self) -> E2eResult<()> {
        self.expect()
            .visible(self.page(), &selectors::order_deleted_toast())
            .await
    }
}
