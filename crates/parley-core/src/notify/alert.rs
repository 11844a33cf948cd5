//! External alert back-ends.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

/// Default sysfs directory of the beepy LED driver.
pub const BEEPY_LED_ROOT: &str = "/sys/firmware/beepy";

const LED_OFF: u8 = 0x00;
const LED_ON: u8 = 0x01;
const LED_FLASH_UNTIL_KEY: u8 = 0x03;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    pub critical: bool,
    pub sound: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Alert backend unavailable: {0}")]
    Unavailable(String),
}

pub trait Alerter: Send + Sync {
    fn raise_alert(&self, alert: &Alert) -> Result<(), AlertError>;
}

/// Records alerts in the log only.
#[derive(Debug, Default)]
pub struct LogAlerter;

impl Alerter for LogAlerter {
    fn raise_alert(&self, alert: &Alert) -> Result<(), AlertError> {
        info!(
            title = %alert.title,
            critical = alert.critical,
            sound = alert.sound,
            "alert"
        );
        Ok(())
    }
}

/// Rings the terminal bell when the alert asks for sound.
pub struct BellAlerter<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> BellAlerter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl BellAlerter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> Alerter for BellAlerter<W> {
    fn raise_alert(&self, alert: &Alert) -> Result<(), AlertError> {
        if !alert.sound {
            return Ok(());
        }
        let mut out = self.out.lock();
        out.write_all(b"\x07")
            .and_then(|_| out.flush())
            .map_err(|source| AlertError::Io {
                path: PathBuf::from("<terminal>"),
                source,
            })
    }
}

/// Notification LED exposed through sysfs.
///
/// Each write sets the red, green and blue channels first and then the mode
/// register. Writes are serialized so two alerts never interleave channels.
#[derive(Debug)]
pub struct LedAlerter {
    root: PathBuf,
    lock: Mutex<()>,
}

impl LedAlerter {
    /// Opens the LED under `root`, failing if its mode register is not writable.
    pub fn probe(root: impl Into<PathBuf>) -> Result<Self, AlertError> {
        let root = root.into();
        let led = root.join("led");
        OpenOptions::new()
            .write(true)
            .open(&led)
            .map_err(|source| AlertError::Io { path: led, source })?;
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    fn write_value(&self, name: &str, value: u16) -> Result<(), AlertError> {
        write_register(&self.root.join(name), value)
    }

    fn set_color(&self, (r, g, b): (u16, u16, u16)) -> Result<(), AlertError> {
        self.write_value("led_red", r)?;
        self.write_value("led_green", g)?;
        self.write_value("led_blue", b)
    }

    pub fn on(&self, color: (u16, u16, u16)) -> Result<(), AlertError> {
        let _guard = self.lock.lock();
        self.set_color(color)?;
        self.write_value("led", LED_ON.into())
    }

    pub fn flash_until_key(&self, color: (u16, u16, u16)) -> Result<(), AlertError> {
        let _guard = self.lock.lock();
        self.set_color(color)?;
        self.write_value("led", LED_FLASH_UNTIL_KEY.into())
    }

    pub fn off(&self) -> Result<(), AlertError> {
        let _guard = self.lock.lock();
        self.write_value("led", LED_OFF.into())
    }
}

fn write_register(path: &Path, value: u16) -> Result<(), AlertError> {
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|source| AlertError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    writeln!(file, "{}", value).map_err(|source| AlertError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Alerter for LedAlerter {
    fn raise_alert(&self, alert: &Alert) -> Result<(), AlertError> {
        let color = if alert.critical {
            (255, 0, 0)
        } else {
            (0, 255, 0)
        };
        self.flash_until_key(color)
    }
}

/// Fans one alert out to several back-ends. A failing back-end is logged and
/// does not stop the others.
#[derive(Default)]
pub struct CompositeAlerter {
    backends: Vec<Box<dyn Alerter>>,
}

impl CompositeAlerter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, backend: impl Alerter + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    pub fn push(&mut self, backend: Box<dyn Alerter>) {
        self.backends.push(backend);
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl Alerter for CompositeAlerter {
    fn raise_alert(&self, alert: &Alert) -> Result<(), AlertError> {
        let mut failed = 0;
        for backend in &self.backends {
            if let Err(e) = backend.raise_alert(alert) {
                warn!("alert backend failed: {}", e);
                failed += 1;
            }
        }
        if failed > 0 && failed == self.backends.len() {
            return Err(AlertError::Unavailable(format!(
                "all {} alert backends failed",
                failed
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn alert(critical: bool, sound: bool) -> Alert {
        Alert {
            title: "bob (Friends)".into(),
            body: "hi".into(),
            critical,
            sound,
        }
    }

    fn led_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in ["led", "led_red", "led_green", "led_blue"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        dir
    }

    fn read(dir: &TempDir, name: &str) -> String {
        fs::read_to_string(dir.path().join(name)).unwrap()
    }

    #[test]
    fn test_bell_only_with_sound() {
        let bell = BellAlerter::new(Vec::new());
        bell.raise_alert(&alert(false, false)).unwrap();
        bell.raise_alert(&alert(false, true)).unwrap();
        assert_eq!(bell.into_inner(), b"\x07".to_vec());
    }

    #[test]
    fn test_led_probe_requires_mode_register() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            LedAlerter::probe(dir.path()),
            Err(AlertError::Io { .. })
        ));
    }

    #[test]
    fn test_led_flashes_green_for_normal_alerts() {
        let dir = led_dir();
        let led = LedAlerter::probe(dir.path()).unwrap();
        led.raise_alert(&alert(false, false)).unwrap();
        assert_eq!(read(&dir, "led_red"), "0\n");
        assert_eq!(read(&dir, "led_green"), "255\n");
        assert_eq!(read(&dir, "led_blue"), "0\n");
        assert_eq!(read(&dir, "led"), "3\n");
    }

    #[test]
    fn test_led_flashes_red_for_critical_alerts() {
        let dir = led_dir();
        let led = LedAlerter::probe(dir.path()).unwrap();
        led.raise_alert(&alert(true, false)).unwrap();
        assert_eq!(read(&dir, "led_red"), "255\n");
        assert_eq!(read(&dir, "led_green"), "0\n");

        led.off().unwrap();
        assert_eq!(read(&dir, "led"), "0\n");
    }

    #[test]
    fn test_composite_tolerates_partial_failure() {
        let dir = led_dir();
        let led = LedAlerter::probe(dir.path()).unwrap();
        fs::remove_file(dir.path().join("led_red")).unwrap();

        let composite = CompositeAlerter::new().with(led).with(LogAlerter);
        assert_eq!(composite.len(), 2);
        assert!(composite.raise_alert(&alert(false, false)).is_ok());

        let broken = CompositeAlerter::new().with(LedAlerter::probe(dir.path()).unwrap());
        assert!(matches!(
            broken.raise_alert(&alert(false, false)),
            Err(AlertError::Unavailable(_))
        ));
    }
}
