//! Checkout state machine.
//!
//! ```text
//! Shipping(1) --submit_shipping (validated)--> Payment(2)
//! Payment(2)  --select_payment-------------->  Review(3)
//! Review(3)   --complete(order id)---------->  Complete(4)
//! Payment(2) / Review(3) --back--> previous step
//! ```
//!
//! `Complete` is terminal. Submitting the order (the network call between
//! `order_request` and `complete`) happens outside this module; if it fails
//! the checkout simply stays at `Review`.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::Cart;
use crate::order::OrderRequest;
use crate::types::{Email, EmailError, OrderId, PaymentMethod};

/// Default shipping country.
pub const DEFAULT_COUNTRY: &str = "United States";

/// Countries offered in the shipping form.
pub const COUNTRIES: [&str; 6] = [
    "United States",
    "Canada",
    "United Kingdom",
    "Australia",
    "Germany",
    "France",
];

/// Checkout steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Payment,
    Review,
    Complete,
}

impl CheckoutStep {
    /// Every step, in order.
    pub const ALL: [Self; 4] = [Self::Shipping, Self::Payment, Self::Review, Self::Complete];

    /// 1-based step number.
    #[must_use]
    pub const fn number(&self) -> u8 {
        match self {
            Self::Shipping => 1,
            Self::Payment => 2,
            Self::Review => 3,
            Self::Complete => 4,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Shipping => "Information",
            Self::Payment => "Payment",
            Self::Review => "Review",
            Self::Complete => "Complete",
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a shipping form was rejected.
#[derive(Debug, Clone, Error)]
pub enum ShippingError {
    /// Required fields were left blank. Holds their labels, in form order.
    #[error("Please fill in: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    /// The email address is malformed.
    #[error("Please enter a valid email address")]
    InvalidEmail(#[source] EmailError),
}

/// Shipping details collected in the first checkout step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "zipCode")]
    pub zip: String,
    pub country: String,
}

impl Default for ShippingInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

impl ShippingInfo {
    /// A blank form with name and email prefilled.
    #[must_use]
    pub fn prefilled(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            ..Self::default()
        }
    }

    /// Fields with their labels, in form order.
    fn labelled_fields(&self) -> [(&'static str, &str); 8] {
        [
            ("Full Name", self.name.as_str()),
            ("Email", self.email.as_str()),
            ("Phone", self.phone.as_str()),
            ("Address", self.address.as_str()),
            ("City", self.city.as_str()),
            ("State", self.state.as_str()),
            ("ZIP Code", self.zip.as_str()),
            ("Country", self.country.as_str()),
        ]
    }

    /// A copy with surrounding whitespace stripped from every field.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip: self.zip.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }

    /// Check the form: every field filled in, then a well-formed email.
    ///
    /// Returns the trimmed form on success.
    ///
    /// # Errors
    ///
    /// [`ShippingError::MissingFields`] lists every blank field (blank email
    /// included); [`ShippingError::InvalidEmail`] is reported only once all
    /// fields are present.
    pub fn validate(&self) -> Result<Self, ShippingError> {
        let info = self.trimmed();

        let missing: Vec<&'static str> = info
            .labelled_fields()
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(label, _)| label)
            .collect();
        if !missing.is_empty() {
            return Err(ShippingError::MissingFields(missing));
        }

        Email::parse(&info.email).map_err(ShippingError::InvalidEmail)?;

        Ok(info)
    }

    /// `address, city, state zip`
    #[must_use]
    pub fn one_line_address(&self) -> String {
        format!("{}, {}, {} {}", self.address, self.city, self.state, self.zip)
    }
}

/// Why a checkout transition was refused.
#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    /// The transition does not start from the current step.
    #[error("cannot do that from the {actual} step")]
    WrongStep { actual: CheckoutStep },
    /// Shipping details failed validation.
    #[error(transparent)]
    Shipping(#[from] ShippingError),
    /// There is nothing to order.
    #[error("Your cart is empty")]
    EmptyCart,
}

/// One checkout session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    step: CheckoutStep,
    shipping: ShippingInfo,
    payment_method: PaymentMethod,
    order_id: Option<OrderId>,
}

impl Checkout {
    /// Start a checkout with shipping name and email prefilled.
    #[must_use]
    pub fn for_customer(name: &str, email: &str) -> Self {
        Self {
            shipping: ShippingInfo::prefilled(name, email),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn shipping(&self) -> &ShippingInfo {
        &self.shipping
    }

    #[must_use]
    pub const fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Id of the placed order, once complete.
    #[must_use]
    pub const fn order_id(&self) -> Option<&OrderId> {
        self.order_id.as_ref()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.step == CheckoutStep::Complete
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), CheckoutError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::WrongStep { actual: self.step })
        }
    }

    /// Shipping -> Payment, if the form is valid.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::WrongStep`] outside the shipping step and
    /// [`CheckoutError::Shipping`] for an invalid form; the checkout is
    /// unchanged in both cases.
    pub fn submit_shipping(&mut self, info: &ShippingInfo) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Shipping)?;
        self.shipping = info.validate()?;
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Payment -> Review. Any offered method is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::WrongStep`] outside the payment step.
    pub fn select_payment(&mut self, method: PaymentMethod) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;
        self.payment_method = method;
        self.step = CheckoutStep::Review;
        Ok(())
    }

    /// Go back one step from Payment or Review.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::WrongStep`] from Shipping or Complete.
    pub fn back(&mut self) -> Result<(), CheckoutError> {
        self.step = match self.step {
            CheckoutStep::Payment => CheckoutStep::Shipping,
            CheckoutStep::Review => CheckoutStep::Payment,
            CheckoutStep::Shipping | CheckoutStep::Complete => {
                return Err(CheckoutError::WrongStep { actual: self.step });
            }
        };
        Ok(())
    }

    /// Build the order to submit from the review step.
    ///
    /// Shipping details are validated again in case the stored copy went
    /// stale.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::WrongStep`] outside review,
    /// [`CheckoutError::EmptyCart`] for an empty cart, or
    /// [`CheckoutError::Shipping`] if the details no longer validate.
    pub fn order_request(&self, cart: &Cart) -> Result<OrderRequest, CheckoutError> {
        self.expect_step(CheckoutStep::Review)?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let shipping = self.shipping.validate()?;
        Ok(OrderRequest::build(&shipping, self.payment_method, cart))
    }

    /// Review -> Complete, recording the order the backend created.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::WrongStep`] outside review.
    pub fn complete(&mut self, order_id: OrderId) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Review)?;
        self.order_id = Some(order_id);
        self.step = CheckoutStep::Complete;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::cart::tests::line;

    pub fn valid_shipping() -> ShippingInfo {
        ShippingInfo {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            address: "12 Harbor Way".to_string(),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            zip: "97201".to_string(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }

    fn at_review() -> Checkout {
        let mut checkout = Checkout::default();
        checkout.submit_shipping(&valid_shipping()).unwrap();
        checkout.select_payment(PaymentMethod::Wallet).unwrap();
        checkout
    }

    #[test]
    fn test_happy_path() {
        let cart = Cart::from_lines([line("p1", 1000, 1)]);
        let mut checkout = Checkout::default();
        assert_eq!(checkout.step().number(), 1);

        checkout.submit_shipping(&valid_shipping()).unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Payment);

        checkout.select_payment(PaymentMethod::PayPal).unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Review);

        let request = checkout.order_request(&cart).unwrap();
        assert_eq!(request.payment_method, PaymentMethod::PayPal);

        checkout.complete(OrderId::new("o-1")).unwrap();
        assert!(checkout.is_complete());
        assert_eq!(checkout.order_id().map(OrderId::as_str), Some("o-1"));
    }

    #[test]
    fn test_empty_email_blocks_shipping() {
        let mut checkout = Checkout::default();
        let info = ShippingInfo {
            email: String::new(),
            ..valid_shipping()
        };
        let err = checkout.submit_shipping(&info).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Shipping(ShippingError::MissingFields(ref fields)) if fields == &vec!["Email"]
        ));
        assert_eq!(checkout.step(), CheckoutStep::Shipping);
    }

    #[test]
    fn test_malformed_email_blocks_shipping() {
        let mut checkout = Checkout::default();
        let info = ShippingInfo {
            email: "abc".to_string(),
            ..valid_shipping()
        };
        let err = checkout.submit_shipping(&info).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Shipping(ShippingError::InvalidEmail(_))
        ));
        assert_eq!(checkout.step(), CheckoutStep::Shipping);
        assert_eq!(checkout.shipping(), &ShippingInfo::default());
    }

    #[test]
    fn test_missing_fields_message_lists_labels() {
        let info = ShippingInfo {
            phone: "  ".to_string(),
            city: String::new(),
            ..valid_shipping()
        };
        let err = info.validate().unwrap_err();
        assert_eq!(err.to_string(), "Please fill in: Phone, City");
    }

    #[test]
    fn test_validate_trims_fields() {
        let info = ShippingInfo {
            name: "  Ada Lovelace ".to_string(),
            ..valid_shipping()
        };
        assert_eq!(info.validate().unwrap().name, "Ada Lovelace");
    }

    #[test]
    fn test_back_navigation() {
        let mut checkout = at_review();
        checkout.back().unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Payment);
        checkout.back().unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Shipping);
        assert!(checkout.back().is_err());
        // Shipping details survive going back
        assert_eq!(checkout.shipping(), &valid_shipping());
    }

    #[test]
    fn test_steps_cannot_be_skipped() {
        let mut checkout = Checkout::default();
        assert!(checkout.select_payment(PaymentMethod::Card).is_err());
        assert!(checkout.complete(OrderId::new("x")).is_err());
        assert!(
            checkout
                .order_request(&Cart::from_lines([line("p", 100, 1)]))
                .is_err()
        );
        assert_eq!(checkout.step(), CheckoutStep::Shipping);
    }

    #[test]
    fn test_empty_cart_cannot_be_ordered() {
        let checkout = at_review();
        assert!(matches!(
            checkout.order_request(&Cart::empty()),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_complete_is_terminal() {
        let mut checkout = at_review();
        checkout.complete(OrderId::new("o-9")).unwrap();
        assert!(checkout.back().is_err());
        assert!(checkout.submit_shipping(&valid_shipping()).is_err());
        assert!(checkout.complete(OrderId::new("o-10")).is_err());
        assert_eq!(checkout.order_id().map(OrderId::as_str), Some("o-9"));
    }

    #[test]
    fn test_prefilled_customer() {
        let checkout = Checkout::for_customer("Ada", "ada@example.com");
        assert_eq!(checkout.shipping().name, "Ada");
        assert_eq!(checkout.shipping().country, DEFAULT_COUNTRY);
    }
}
