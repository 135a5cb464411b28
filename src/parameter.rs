//! The layered 14-bit parameter-negotiation mechanism: the saturating [`Value14`] wire quantity,
//! the fixed-capacity [`ParameterTable`] tracking concurrently open parameters, and the
//! [`ParameterSession`] intent tracker driven by the outbound control-change senders.

mod session;
pub use session::*;

mod table;
pub use table::*;

mod value;
pub use value::*;
