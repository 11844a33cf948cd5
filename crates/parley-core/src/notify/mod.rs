pub mod alert;
pub mod arbiter;

pub use alert::{
    Alert, AlertError, Alerter, BellAlerter, CompositeAlerter, LedAlerter, LogAlerter,
    BEEPY_LED_ROOT,
};
pub use arbiter::{AlertSettings, FocusClock, NotificationArbiter, ReadOutcome, Verdict};
