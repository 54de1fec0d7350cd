//! In-memory storefront implementing `BrowserPage`
//!
//! Locators are resolved by comparing them with the page-object selector
//! builders, so the fake only understands what the page objects ask for.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use storefront_e2e::locator::{LoadState, Locator, WaitState};
use storefront_e2e::pages::selectors;
use storefront_e2e::{BrowserPage, E2eError, E2eResult, TestData};

pub const EMAIL: &str = "jane@example.com";
pub const PASSWORD: &str = "s3cret";

pub fn test_data() -> TestData {
    TestData::from_json(
        r#"{
        "applicationUrl": "https://shop.example.com/client",
        "loginCredentials": { "email": "jane@example.com", "password": "s3cret" },
        "products": { "zaraCoat": "Zara Coat", "iPhone": "IPHONE 13 PRO" },
        "paymentDetails": { "cvv": "123", "cardholderName": "Jane Doe" },
        "couponCode": "SAVE10",
        "country": "India",
        "orderConfirmationProduct": "Zara Coat"
    }"#,
    )
    .unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Blank,
    Login,
    Dashboard,
    Cart,
    Checkout,
    Confirmation,
    Orders,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeOrder {
    pub id: String,
    pub product: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Element {
    EmailInput,
    PasswordInput,
    LoginButton,
    OrderIdLabel,
    SignOut,
    AddToCart(String),
    ProductAddedToast,
    CartButton,
    CartTitle,
    CheckoutButton,
    CvvInput,
    CardholderInput,
    CouponInput,
    ApplyCoupon,
    CouponApplied,
    CountryInput,
    CountryResults,
    CountryOption(String),
    PlaceOrder,
    ConfirmationHeading,
    ConfirmationTitle,
    OrdersButton,
    OrderRows,
    OrderRow(usize),
    OrderRowId(usize),
    OrderRowDelete(usize),
    OrderDeletedToast,
}

#[derive(Debug)]
struct State {
    view: View,
    url: Option<String>,
    logged_in: bool,
    email: String,
    password: String,
    cart: Vec<String>,
    product_toast: bool,
    cvv: String,
    cardholder: String,
    coupon: String,
    coupon_applied: bool,
    country_typed: String,
    /// Suggestions only become clickable once the results panel was awaited.
    results_awaited: bool,
    country: Option<String>,
    last_order: Option<FakeOrder>,
    orders: Vec<FakeOrder>,
    deleted_toast: bool,
    next_order: u32,
    actions: Vec<String>,
    screenshots: usize,
}

/// Storefront double: catalog, cart, checkout and order history in memory.
pub struct FakeStorefront {
    catalog: Vec<String>,
    countries: Vec<String>,
    coupons: Vec<String>,
    order_id_label: Option<String>,
    state: Mutex<State>,
}

impl FakeStorefront {
    pub fn new() -> Self {
        Self {
            catalog: vec!["Zara Coat".into(), "ADIDAS ORIGINAL".into(), "IPHONE 13 PRO".into()],
            countries: vec!["British Indian Ocean Territory".into(), "India".into(), "Indonesia".into()],
            coupons: vec!["SAVE10".into()],
            order_id_label: None,
            state: Mutex::new(State {
                view: View::Blank,
                url: None,
                logged_in: false,
                email: String::new(),
                password: String::new(),
                cart: Vec::new(),
                product_toast: false,
                cvv: String::new(),
                cardholder: String::new(),
                coupon: String::new(),
                coupon_applied: false,
                country_typed: String::new(),
                results_awaited: false,
                country: None,
                last_order: None,
                orders: Vec::new(),
                deleted_toast: false,
                next_order: 1,
                actions: Vec::new(),
                screenshots: 0,
            }),
        }
    }

    /// Orders already present in the history before the scenario runs.
    pub fn with_orders(self, orders: &[(&str, &str)]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.orders = orders
                .iter()
                .map(|(id, product)| FakeOrder {
                    id: id.to_string(),
                    product: product.to_string(),
                })
                .collect();
        }
        self
    }

    /// Render the confirmation label with this raw text instead of the
    /// generated order id.
    pub fn with_order_id_label(mut self, raw: &str) -> Self {
        self.order_id_label = Some(raw.to_string());
        self
    }

    /// Open the orders page directly, already logged in.
    pub fn on_orders_page(self) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.logged_in = true;
            state.view = View::Orders;
        }
        self
    }

    pub fn view(&self) -> View {
        self.state.lock().unwrap().view
    }

    pub fn orders(&self) -> Vec<FakeOrder> {
        self.state.lock().unwrap().orders.clone()
    }

    pub fn last_order(&self) -> Option<FakeOrder> {
        self.state.lock().unwrap().last_order.clone()
    }

    pub fn cart(&self) -> Vec<String> {
        self.state.lock().unwrap().cart.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.lock().unwrap().logged_in
    }

    /// Every click, fill, typing action and successful wait, as
    /// `<op> <locator>`.
    pub fn actions(&self) -> Vec<String> {
        self.state.lock().unwrap().actions.clone()
    }

    pub fn screenshots_taken(&self) -> usize {
        self.state.lock().unwrap().screenshots
    }

    fn resolve(&self, locator: &Locator, state: &State) -> Option<Element> {
        let fixed = [
            (selectors::email_input(), Element::EmailInput),
            (selectors::password_input(), Element::PasswordInput),
            (selectors::login_button(), Element::LoginButton),
            (selectors::order_id_label(), Element::OrderIdLabel),
            (selectors::sign_out_button(), Element::SignOut),
            (selectors::product_added_toast(), Element::ProductAddedToast),
            (selectors::cart_button(), Element::CartButton),
            (selectors::cart_product_title(), Element::CartTitle),
            (selectors::checkout_button(), Element::CheckoutButton),
            (selectors::cvv_input(), Element::CvvInput),
            (selectors::cardholder_input(), Element::CardholderInput),
            (selectors::coupon_input(), Element::CouponInput),
            (selectors::apply_coupon_button(), Element::ApplyCoupon),
            (selectors::coupon_applied_text(), Element::CouponApplied),
            (selectors::country_input(), Element::CountryInput),
            (selectors::country_results(), Element::CountryResults),
            (selectors::place_order_button(), Element::PlaceOrder),
            (selectors::confirmation_heading(), Element::ConfirmationHeading),
            (selectors::confirmation_line_item_title(), Element::ConfirmationTitle),
            (selectors::orders_button(), Element::OrdersButton),
            (selectors::order_rows(), Element::OrderRows),
            (selectors::order_deleted_toast(), Element::OrderDeletedToast),
        ];
        if let Some((_, element)) = fixed.into_iter().find(|(l, _)| l == locator) {
            return Some(element);
        }

        if let Some(product) = self
            .catalog
            .iter()
            .find(|p| selectors::add_to_cart_button(p) == *locator)
        {
            return Some(Element::AddToCart(product.clone()));
        }
        if let Some(country) = self
            .countries
            .iter()
            .find(|c| selectors::country_option(c) == *locator)
        {
            return Some(Element::CountryOption(country.clone()));
        }

        (0..state.orders.len().max(1)).find_map(|i| {
            if selectors::order_row(i) == *locator {
                Some(Element::OrderRow(i))
            } else if selectors::order_row_id_cell(i) == *locator {
                Some(Element::OrderRowId(i))
            } else if selectors::order_row_delete_button(i) == *locator {
                Some(Element::OrderRowDelete(i))
            } else {
                None
            }
        })
    }

    /// Whether `element` is currently rendered.
    fn present(&self, element: &Element, state: &State) -> bool {
        let nav = state.logged_in && state.view != View::Login;
        match element {
            Element::EmailInput | Element::PasswordInput | Element::LoginButton => state.view == View::Login,
            Element::SignOut | Element::CartButton | Element::OrdersButton => nav,
            Element::AddToCart(_) => state.view == View::Dashboard,
            Element::ProductAddedToast => state.view == View::Dashboard && state.product_toast,
            Element::CartTitle | Element::CheckoutButton => state.view == View::Cart && !state.cart.is_empty(),
            Element::CvvInput
            | Element::CardholderInput
            | Element::CouponInput
            | Element::ApplyCoupon
            | Element::CountryInput
            | Element::PlaceOrder => state.view == View::Checkout,
            Element::CouponApplied => state.view == View::Checkout && state.coupon_applied,
            Element::CountryResults => state.view == View::Checkout && !self.suggestions(state).is_empty(),
            Element::CountryOption(country) => {
                state.view == View::Checkout && state.results_awaited && self.suggestions(state).contains(country)
            }
            Element::OrderIdLabel | Element::ConfirmationHeading | Element::ConfirmationTitle => {
                state.view == View::Confirmation
            }
            Element::OrderRows => state.view == View::Orders,
            Element::OrderRow(i) | Element::OrderRowId(i) | Element::OrderRowDelete(i) => {
                state.view == View::Orders && *i < state.orders.len()
            }
            Element::OrderDeletedToast => state.view == View::Orders && state.deleted_toast,
        }
    }

    fn suggestions(&self, state: &State) -> Vec<String> {
        if state.country_typed.is_empty() {
            return Vec::new();
        }
        let typed = state.country_typed.to_lowercase();
        self.countries
            .iter()
            .filter(|c| c.to_lowercase().contains(&typed))
            .cloned()
            .collect()
    }

    fn find(&self, locator: &Locator, state: &State) -> E2eResult<Element> {
        match self.resolve(locator, state) {
            Some(element) if self.present(&element, state) => Ok(element),
            _ => Err(E2eError::Timeout(format!("{locator}: no element on {:?}", state.view))),
        }
    }

    /// The cart renders one title per line item.
    fn check_strict(&self, locator: &Locator, element: &Element, state: &State) -> E2eResult<()> {
        if *element == Element::CartTitle && state.cart.len() > 1 {
            return Err(E2eError::Locator {
                locator: locator.to_string(),
                reason: format!("strict mode violation: resolved to {} elements", state.cart.len()),
            });
        }
        Ok(())
    }

    fn text_of(&self, element: &Element, state: &State) -> Option<String> {
        match element {
            Element::CartTitle => state.cart.last().cloned(),
            Element::ConfirmationTitle => state.last_order.as_ref().map(|o| format!(" {} ", o.product)),
            Element::ConfirmationHeading => Some(format!(" {} ", selectors::CONFIRMATION_HEADING)),
            Element::OrderIdLabel => match &self.order_id_label {
                Some(raw) => Some(raw.clone()),
                None => state.last_order.as_ref().map(|o| format!(" | {} | ", o.id)),
            },
            Element::OrderRowId(i) => state.orders.get(*i).map(|o| format!(" {} ", o.id)),
            Element::OrderRow(i) => state
                .orders
                .get(*i)
                .map(|o| format!("{}  {}  $ 31500 Tue Oct 20 View Delete", o.id, o.product)),
            Element::CouponApplied => Some(selectors::COUPON_APPLIED_TEXT.to_string()),
            Element::ProductAddedToast => Some(selectors::PRODUCT_ADDED_TEXT.to_string()),
            _ => None,
        }
    }
}

#[async_trait]
impl BrowserPage for FakeStorefront {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        if !url.starts_with("http") {
            return Err(E2eError::Navigation(format!("{url}: invalid URL")));
        }
        let mut state = self.state.lock().unwrap();
        state.url = Some(url.to_string());
        state.view = if state.logged_in { View::Dashboard } else { View::Login };
        Ok(())
    }

    async fn wait_for_load_state(&self, _state: LoadState) -> E2eResult<()> {
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        let mut state = self.state.lock().unwrap();
        let element = self.find(locator, &state)?;
        state.actions.push(format!("click {locator}"));

        match element {
            Element::LoginButton => {
                if state.email == EMAIL && state.password == PASSWORD {
                    state.logged_in = true;
                    state.view = View::Dashboard;
                }
            }
            Element::AddToCart(product) => {
                state.cart.push(product);
                state.product_toast = true;
            }
            Element::CartButton => {
                state.view = View::Cart;
                state.product_toast = false;
            }
            Element::CheckoutButton => state.view = View::Checkout,
            Element::ApplyCoupon => state.coupon_applied = self.coupons.contains(&state.coupon),
            Element::CountryOption(country) => {
                state.country = Some(country);
                state.country_typed.clear();
                state.results_awaited = false;
            }
            Element::PlaceOrder => {
                if state.country.is_some() && !state.cart.is_empty() {
                    let id = format!("6a{:010x}", 0xbeef00 + state.next_order);
                    state.next_order += 1;
                    let product = state.cart.last().cloned().unwrap_or_default();
                    let order = FakeOrder { id, product };
                    state.orders.push(order.clone());
                    state.last_order = Some(order);
                    state.cart.clear();
                    state.view = View::Confirmation;
                }
            }
            Element::OrdersButton => {
                state.view = View::Orders;
                state.deleted_toast = false;
            }
            Element::OrderRowDelete(i) => {
                state.orders.remove(i);
                state.deleted_toast = true;
            }
            Element::SignOut => {
                state.logged_in = false;
                state.view = View::Login;
            }
            _ => {}
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        let mut state = self.state.lock().unwrap();
        let element = self.find(locator, &state)?;
        state.actions.push(format!("fill {locator}"));

        match element {
            Element::EmailInput => state.email = value.to_string(),
            Element::PasswordInput => state.password = value.to_string(),
            Element::CvvInput => state.cvv = value.to_string(),
            Element::CardholderInput => state.cardholder = value.to_string(),
            Element::CouponInput => state.coupon = value.to_string(),
            _ => {
                return Err(E2eError::Locator {
                    locator: locator.to_string(),
                    reason: "element is not an <input>".to_string(),
                })
            }
        }
        Ok(())
    }

    async fn press_sequentially(&self, locator: &Locator, text: &str, _delay: Duration) -> E2eResult<()> {
        let mut state = self.state.lock().unwrap();
        match self.find(locator, &state)? {
            Element::CountryInput => {
                state.actions.push(format!("type {locator}"));
                state.country_typed.push_str(text);
                state.results_awaited = false;
                Ok(())
            }
            _ => Err(E2eError::Locator {
                locator: locator.to_string(),
                reason: "element is not editable".to_string(),
            }),
        }
    }

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>> {
        let state = self.state.lock().unwrap();
        let element = self.find(locator, &state)?;
        self.check_strict(locator, &element, &state)?;
        Ok(self.text_of(&element, &state))
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        let state = self.state.lock().unwrap();
        Ok(match self.resolve(locator, &state) {
            Some(Element::OrderRows) if state.view == View::Orders => state.orders.len(),
            Some(element) if self.present(&element, &state) => 1,
            _ => 0,
        })
    }

    async fn wait_for(&self, locator: &Locator, wait: WaitState, timeout: Duration) -> E2eResult<()> {
        let mut state = self.state.lock().unwrap();
        let found = self.find(locator, &state).ok();
        if let Some(element) = &found {
            self.check_strict(locator, element, &state)?;
        }
        let wanted = matches!(wait, WaitState::Visible | WaitState::Attached);
        if found.is_some() == wanted {
            if found == Some(Element::CountryResults) && wait == WaitState::Visible {
                state.results_awaited = true;
            }
            state.actions.push(format!("wait {locator}"));
            Ok(())
        } else {
            Err(E2eError::Timeout(format!("{locator} to be {wait:?} within {timeout:?}")))
        }
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        let view = {
            let mut state = self.state.lock().unwrap();
            state.screenshots += 1;
            state.view
        };
        let shade = view as u8 * 30;
        let img = image::RgbImage::from_pixel(16, 12, image::Rgb([shade, 255 - shade, 128]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)?;
        Ok(png)
    }
}
