pub mod callback;
pub mod form;
pub mod gateway;
pub mod outcome;
pub mod redirect;
pub mod relay;
pub mod resolver;

pub use callback::CallbackRouter;
pub use form::FormSynthesizer;
pub use gateway::{HttpGateway, PaymentGateway};
pub use outcome::{classify, Outcome};
pub use redirect::Destinations;
pub use relay::GatewayRelay;
pub use resolver::{Channel, OutcomeResolver, Resolution};
