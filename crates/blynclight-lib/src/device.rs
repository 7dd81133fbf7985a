//! HID collaborator traits and platform backends.

use std::fmt;

use serde::Serialize;

use crate::claims::ClaimRegistry;

// ── Error type ──

/// Device discovery, claim and I/O errors.
///
/// String payloads follow the convention **"context: details"** where *context*
/// identifies the operation or step (e.g. `"USB open"`, `"SET_REPORT"`) and
/// *details* describes what went wrong.
#[derive(Debug)]
pub enum DeviceError {
    /// Requested index is not among the currently attached lights.
    NotFound { index: usize, available: usize },
    /// Vendor id is not a known BlyncLight vendor.
    UnknownDevice { vendor_id: u16, product_id: u16 },
    /// Device is already claimed by another live session.
    InUse(String),
    OpenFailed(String),
    WriteFailed(String),
    /// Session was closed before the write.
    Closed,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotFound { index, available } => {
                write!(f, "BlyncLight not found: index {index}, {available} available")
            }
            DeviceError::UnknownDevice {
                vendor_id,
                product_id,
            } => write!(
                f,
                "Unknown device {vendor_id:04x}:{product_id:04x} (not an Embrava vendor id)"
            ),
            DeviceError::InUse(path) => write!(f, "BlyncLight in use: {path}"),
            DeviceError::OpenFailed(e) => write!(f, "Failed to open device: {e}"),
            DeviceError::WriteFailed(e) => write!(f, "Write failed: {e}"),
            DeviceError::Closed => write!(f, "BlyncLight is closed"),
        }
    }
}

impl std::error::Error for DeviceError {}

pub type Result<T> = std::result::Result<T, DeviceError>;

// ── Device info ──

/// A discovered light (not yet claimed or opened).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LightInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Transport path, unique per attached device (e.g. `usb:001/004`).
    pub path: String,
    /// USB serial number, if available.
    pub serial: Option<String>,
    /// USB product string, if available.
    pub product: Option<String>,
}

impl LightInfo {
    /// Key used for exclusive claims.
    pub fn claim_key(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for LightInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:04x}:{:04x}]",
            self.path, self.vendor_id, self.product_id
        )?;
        if let Some(ref product) = self.product {
            write!(f, " {product}")?;
        }
        Ok(())
    }
}

// ── Traits ──

/// An open, claimed transport to one light.
pub trait HidDevice {
    /// Write one output report. Returns the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Release the transport. Called once, before drop.
    fn close(&mut self) {}
}

/// Discovery and open for a family of devices.
pub trait HidBackend {
    type Device: HidDevice;

    /// List attached devices whose vendor id is in `vendor_ids`.
    fn enumerate(&self, vendor_ids: &[u16]) -> Result<Vec<LightInfo>>;

    /// Open the transport for a previously enumerated device.
    fn open(&self, info: &LightInfo) -> Result<Self::Device>;

    /// Registry that enforces one session per device.
    fn claims(&self) -> &ClaimRegistry {
        ClaimRegistry::global()
    }
}

// ── Linux implementation ──

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::time::Duration;

    use nusb::transfer::{Control, ControlType, Recipient};

    use crate::protocol::{
        HID_REPORT_TYPE_OUTPUT, HID_SET_REPORT, REPORT_ID, USB_CLASS_HID, USB_TIMEOUT_MS,
    };

    /// Host USB backend built on `nusb`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct UsbBackend;

    pub struct UsbLight {
        interface: nusb::Interface,
        interface_number: u16,
        path: String,
    }

    fn bus_path(dev: &nusb::DeviceInfo) -> String {
        format!("usb:{:03}/{:03}", dev.bus_number(), dev.device_address())
    }

    fn hid_interface(dev: &nusb::DeviceInfo) -> Option<u8> {
        dev.interfaces()
            .find(|iface| iface.class() == USB_CLASS_HID)
            .map(|iface| iface.interface_number())
    }

    impl HidBackend for UsbBackend {
        type Device = UsbLight;

        fn enumerate(&self, vendor_ids: &[u16]) -> Result<Vec<LightInfo>> {
            let devices = nusb::list_devices()
                .map_err(|e| DeviceError::OpenFailed(format!("USB enumeration: {e}")))?;

            Ok(devices
                .filter(|dev| vendor_ids.contains(&dev.vendor_id()))
                .filter(|dev| hid_interface(dev).is_some())
                .map(|dev| LightInfo {
                    vendor_id: dev.vendor_id(),
                    product_id: dev.product_id(),
                    path: bus_path(&dev),
                    serial: dev.serial_number().map(|s| s.to_string()),
                    product: dev.product_string().map(|s| s.to_string()),
                })
                .collect())
        }

        fn open(&self, info: &LightInfo) -> Result<UsbLight> {
            let dev_info = nusb::list_devices()
                .map_err(|e| DeviceError::OpenFailed(format!("USB enumeration: {e}")))?
                .find(|dev| bus_path(dev) == info.path)
                .ok_or_else(|| {
                    DeviceError::OpenFailed(format!("{}: no longer attached", info.path))
                })?;

            let iface_num = hid_interface(&dev_info)
                .ok_or_else(|| DeviceError::OpenFailed(format!("{}: no HID interface", info.path)))?;

            let usb_device = dev_info
                .open()
                .map_err(|e| DeviceError::OpenFailed(format!("USB open: {e}")))?;

            // usbhid owns the interface until we detach it.
            let interface = usb_device
                .detach_and_claim_interface(iface_num)
                .map_err(|e| {
                    if e.kind() == std::io::ErrorKind::ResourceBusy {
                        DeviceError::InUse(info.path.clone())
                    } else {
                        DeviceError::OpenFailed(format!("claim interface {iface_num}: {e}"))
                    }
                })?;

            log::debug!("opened {info} (interface {iface_num})");

            Ok(UsbLight {
                interface,
                interface_number: u16::from(iface_num),
                path: info.path.clone(),
            })
        }
    }

    impl HidDevice for UsbLight {
        fn write(&mut self, data: &[u8]) -> Result<usize> {
            let Some((&report_id, payload)) = data.split_first() else {
                return Err(DeviceError::WriteFailed("SET_REPORT: empty report".into()));
            };
            debug_assert_eq!(report_id, REPORT_ID);

            // The report number travels in wValue, not in the payload.
            let control = Control {
                control_type: ControlType::Class,
                recipient: Recipient::Interface,
                request: HID_SET_REPORT,
                value: (HID_REPORT_TYPE_OUTPUT << 8) | u16::from(report_id),
                index: self.interface_number,
            };
            let sent = self
                .interface
                .control_out_blocking(control, payload, Duration::from_millis(USB_TIMEOUT_MS))
                .map_err(|e| DeviceError::WriteFailed(format!("SET_REPORT({}): {e}", self.path)))?;
            Ok(sent + 1)
        }

        fn close(&mut self) {
            log::debug!("closing {}", self.path);
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux_impl::{UsbBackend, UsbLight};

// ── Stub backend for unsupported platforms ──

/// Placeholder backend that never finds a light.
/// Enables compilation and `cargo test` on unsupported hosts.
#[cfg(not(target_os = "linux"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct StubBackend;

#[cfg(not(target_os = "linux"))]
pub struct StubDevice;

#[cfg(not(target_os = "linux"))]
impl HidDevice for StubDevice {
    fn write(&mut self, _data: &[u8]) -> Result<usize> {
        Err(DeviceError::WriteFailed(
            "stub: no USB backend on this platform".into(),
        ))
    }
}

#[cfg(not(target_os = "linux"))]
impl HidBackend for StubBackend {
    type Device = StubDevice;

    fn enumerate(&self, _vendor_ids: &[u16]) -> Result<Vec<LightInfo>> {
        Ok(Vec::new())
    }

    fn open(&self, info: &LightInfo) -> Result<StubDevice> {
        Err(DeviceError::OpenFailed(format!(
            "{}: no USB backend on this platform",
            info.path
        )))
    }
}

/// Concrete backend for the current platform.
#[cfg(target_os = "linux")]
pub type PlatformBackend = UsbBackend;
#[cfg(not(target_os = "linux"))]
pub type PlatformBackend = StubBackend;

/// Concrete device type for the current platform.
pub type PlatformDevice = <PlatformBackend as HidBackend>::Device;

// ── Mock backend for testing ──

/// In-memory backend for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::protocol::EMBRAVA_VENDOR_IDS;

    /// Fake attached lights. Every device opened from this backend records
    /// its writes into the shared `writes` log.
    pub struct MockBackend {
        pub lights: RefCell<Vec<LightInfo>>,
        /// Every successful write, in order, across all opened devices.
        pub writes: Rc<RefCell<Vec<Vec<u8>>>>,
        /// If true, device writes return an error.
        pub fail_writes: Rc<Cell<bool>>,
        /// If set, device writes report this many bytes instead of the full length.
        pub short_write: Rc<Cell<Option<usize>>>,
        /// Number of `close()` calls seen.
        pub closes: Rc<Cell<usize>>,
        /// If true, `enumerate` fails as if the bus could not be listed.
        pub fail_enumerate: Cell<bool>,
        claims: ClaimRegistry,
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self::with_lights(1)
        }
    }

    impl MockBackend {
        /// Backend with `count` attached lights.
        pub fn with_lights(count: usize) -> Self {
            let lights = (0..count)
                .map(|i| LightInfo {
                    vendor_id: EMBRAVA_VENDOR_IDS[0],
                    product_id: 0x0001,
                    path: format!("mock://{i}"),
                    serial: Some(format!("MOCK{i:04}")),
                    product: Some("BlyncLight".into()),
                })
                .collect();
            MockBackend {
                lights: RefCell::new(lights),
                writes: Rc::new(RefCell::new(Vec::new())),
                fail_writes: Rc::new(Cell::new(false)),
                short_write: Rc::new(Cell::new(None)),
                closes: Rc::new(Cell::new(0)),
                fail_enumerate: Cell::new(false),
                claims: ClaimRegistry::new(),
            }
        }

        /// Number of writes recorded so far.
        pub fn write_count(&self) -> usize {
            self.writes.borrow().len()
        }

        /// Most recent write, if any.
        pub fn last_write(&self) -> Option<Vec<u8>> {
            self.writes.borrow().last().cloned()
        }

        pub fn clear_writes(&self) {
            self.writes.borrow_mut().clear();
        }
    }

    pub struct MockDevice {
        pub info: LightInfo,
        writes: Rc<RefCell<Vec<Vec<u8>>>>,
        fail_writes: Rc<Cell<bool>>,
        short_write: Rc<Cell<Option<usize>>>,
        closes: Rc<Cell<usize>>,
    }

    impl HidDevice for MockDevice {
        fn write(&mut self, data: &[u8]) -> Result<usize> {
            if self.fail_writes.get() {
                return Err(DeviceError::WriteFailed(format!(
                    "{}: mock write failure injected",
                    self.info.path
                )));
            }
            self.writes.borrow_mut().push(data.to_vec());
            Ok(self.short_write.get().unwrap_or(data.len()))
        }

        fn close(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    impl HidBackend for MockBackend {
        type Device = MockDevice;

        fn enumerate(&self, vendor_ids: &[u16]) -> Result<Vec<LightInfo>> {
            if self.fail_enumerate.get() {
                return Err(DeviceError::OpenFailed(
                    "USB enumeration: mock failure injected".into(),
                ));
            }
            Ok(self
                .lights
                .borrow()
                .iter()
                .filter(|l| vendor_ids.contains(&l.vendor_id))
                .cloned()
                .collect())
        }

        fn open(&self, info: &LightInfo) -> Result<MockDevice> {
            if !self.lights.borrow().iter().any(|l| l.path == info.path) {
                return Err(DeviceError::OpenFailed(format!(
                    "{}: no longer attached",
                    info.path
                )));
            }
            Ok(MockDevice {
                info: info.clone(),
                writes: Rc::clone(&self.writes),
                fail_writes: Rc::clone(&self.fail_writes),
                short_write: Rc::clone(&self.short_write),
                closes: Rc::clone(&self.closes),
            })
        }

        fn claims(&self) -> &ClaimRegistry {
            &self.claims
        }
    }
}
