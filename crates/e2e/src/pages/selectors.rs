//! Locators for every storefront element the page objects touch

use crate::locator::{xpath_literal, AriaRole, Locator};

/// The product-added toast renders several nested `div`s carrying the same
/// text; this occurrence is the visible message box.
pub const PRODUCT_ADDED_TOAST_OCCURRENCE: usize = 2;

pub const PRODUCT_ADDED_TEXT: &str = "Product Added To Cart";
pub const COUPON_APPLIED_TEXT: &str = "* Coupon Applied";
pub const CONFIRMATION_HEADING: &str = "Thankyou for the order.";
pub const ORDERS_DELETED_LABEL: &str = "Orders Deleted Successfully";

// Login and session

pub fn email_input() -> Locator {
    Locator::css("#userEmail")
}

pub fn password_input() -> Locator {
    Locator::css("#userPassword")
}

pub fn login_button() -> Locator {
    Locator::css("input[value='Login']")
}

pub fn order_id_label() -> Locator {
    Locator::css("label.ng-star-inserted")
}

pub fn sign_out_button() -> Locator {
    Locator::role(AriaRole::Button, Some("Sign Out"))
}

// Catalog and cart

/// The card whose bold title is exactly `product`.
pub fn product_card(product: &str) -> Locator {
    Locator::css(".card-body").has(Locator::css("b").has_text_exact(product))
}

pub fn add_to_cart_button(product: &str) -> Locator {
    product_card(product).get_by_text("Add to Cart")
}

pub fn product_added_toast() -> Locator {
    Locator::css("div")
        .has_text(PRODUCT_ADDED_TEXT)
        .nth(PRODUCT_ADDED_TOAST_OCCURRENCE)
}

pub fn cart_button() -> Locator {
    Locator::css(".btn.btn-custom[routerlink='/dashboard/cart']")
}

pub fn cart_product_title() -> Locator {
    Locator::css(".cartSection h3")
}

pub fn checkout_button() -> Locator {
    Locator::css("li[class='totalRow'] button[type='button']")
}

// Payment form

/// Payment textboxes are only addressable by position: 1 is CVV, 2 is the
/// cardholder name.
pub fn payment_textbox(position: usize) -> Locator {
    Locator::role(AriaRole::Textbox, None).nth(position)
}

pub fn cvv_input() -> Locator {
    payment_textbox(1)
}

pub fn cardholder_input() -> Locator {
    payment_textbox(2)
}

pub fn coupon_input() -> Locator {
    Locator::css("input[name=\"coupon\"]")
}

pub fn apply_coupon_button() -> Locator {
    Locator::role(AriaRole::Button, Some("Apply Coupon"))
}

pub fn coupon_applied_text() -> Locator {
    Locator::text(COUPON_APPLIED_TEXT)
}

pub fn country_input() -> Locator {
    Locator::css("input[placeholder='Select Country']")
}

pub fn country_results() -> Locator {
    Locator::css("section.ta-results")
}

/// Suggestion whose normalized text is exactly `country`.
pub fn country_option(country: &str) -> Locator {
    Locator::xpath(format!("//span[normalize-space()={}]", xpath_literal(country)))
}

pub fn place_order_button() -> Locator {
    Locator::text("Place Order")
}

// Confirmation

pub fn confirmation_heading() -> Locator {
    Locator::role(AriaRole::Heading, Some(CONFIRMATION_HEADING))
}

pub fn confirmation_line_item_title() -> Locator {
    Locator::css("td[class='line-item product-info-column m-3'] div[class='title']")
}

// Order history

pub fn orders_button() -> Locator {
    Locator::css("button[routerlink='/dashboard/myorders']")
}

pub fn order_rows() -> Locator {
    Locator::css("tbody tr")
}

pub fn order_row(index: usize) -> Locator {
    order_rows().nth(index)
}

pub fn order_row_id_cell(index: usize) -> Locator {
    order_row(index).locator("th")
}

pub fn order_row_delete_button(index: usize) -> Locator {
    order_row(index).locator("button[class='btn btn-danger']")
}

pub fn order_deleted_toast() -> Locator {
    Locator::css(format!("#toast-container div[aria-label='{ORDERS_DELETED_LABEL}']"))
}
