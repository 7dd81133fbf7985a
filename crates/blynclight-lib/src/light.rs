//! BlyncLight session: a claimed device plus its command word.
//!
//! Every field mutation is pushed to the device as a full command while
//! `immediate` is set and no [`PausedUpdates`] scope is open. Opening a scope
//! holds writes back until the outermost scope ends, so a multi-field change
//! (e.g. a color) reaches the hardware as one command.

use std::ops::{Deref, DerefMut};

use crate::claims::Claim;
use crate::color::Color;
use crate::command::{CommandError, CommandWord, Field, Status};
use crate::device::{DeviceError, HidBackend, HidDevice, LightInfo, Result};
use crate::protocol::{COMMAND_LENGTH, EMBRAVA_VENDOR_IDS, is_known_vendor};

/// An exclusively claimed BlyncLight.
pub struct BlyncLight<D: HidDevice> {
    info: LightInfo,
    device: Option<D>,
    claim: Option<Claim>,
    word: CommandWord,
    immediate: bool,
    saved_immediate: bool,
    depth: usize,
}

impl<D: HidDevice> BlyncLight<D> {
    // ── Discovery / lifecycle ──

    /// All attached lights with a known vendor id. Claims nothing.
    pub fn available_lights<B>(backend: &B) -> Result<Vec<LightInfo>>
    where
        B: HidBackend<Device = D>,
    {
        backend.enumerate(&EMBRAVA_VENDOR_IDS)
    }

    /// Claim and open the `index`th attached light.
    pub fn get_light<B>(backend: &B, index: usize) -> Result<Self>
    where
        B: HidBackend<Device = D>,
    {
        let lights = Self::available_lights(backend)?;
        let available = lights.len();
        let info = lights
            .into_iter()
            .nth(index)
            .ok_or(DeviceError::NotFound { index, available })?;
        Self::claim(backend, info)
    }

    /// Claim and open the first attached light matching `vendor_id:product_id`.
    pub fn open<B>(backend: &B, vendor_id: u16, product_id: u16) -> Result<Self>
    where
        B: HidBackend<Device = D>,
    {
        if !is_known_vendor(vendor_id) {
            return Err(DeviceError::UnknownDevice {
                vendor_id,
                product_id,
            });
        }
        let lights = Self::available_lights(backend)?;
        let available = lights.len();
        let info = lights
            .into_iter()
            .find(|l| l.vendor_id == vendor_id && l.product_id == product_id)
            .ok_or(DeviceError::NotFound {
                index: 0,
                available,
            })?;
        Self::claim(backend, info)
    }

    /// Claim and open a specific enumerated light.
    pub fn claim<B>(backend: &B, info: LightInfo) -> Result<Self>
    where
        B: HidBackend<Device = D>,
    {
        if !is_known_vendor(info.vendor_id) {
            return Err(DeviceError::UnknownDevice {
                vendor_id: info.vendor_id,
                product_id: info.product_id,
            });
        }
        // Claim before open so a losing session never touches the transport.
        let claim = backend.claims().claim(info.claim_key())?;
        let device = backend.open(&info)?;
        log::debug!("session opened for {info}");
        Ok(BlyncLight {
            info,
            device: Some(device),
            claim: Some(claim),
            word: CommandWord::default(),
            immediate: true,
            saved_immediate: true,
            depth: 0,
        })
    }

    /// Release the transport and the claim. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.close();
            log::debug!("session closed for {}", self.info);
        }
        self.claim = None;
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    pub fn info(&self) -> &LightInfo {
        &self.info
    }

    pub fn vendor_id(&self) -> u16 {
        self.info.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.info.product_id
    }

    /// The underlying transport, while open.
    pub fn device(&self) -> Option<&D> {
        self.device.as_ref()
    }

    // ── Command word ──

    pub fn command(&self) -> &CommandWord {
        &self.word
    }

    /// Length of the command in bits.
    pub fn len(&self) -> usize {
        CommandWord::BITS
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn bytes(&self) -> [u8; COMMAND_LENGTH] {
        self.word.to_bytes()
    }

    /// Write the current command to the device.
    pub fn update(&mut self) -> Result<()> {
        let bytes = self.word.to_bytes();
        let device = self.device.as_mut().ok_or(DeviceError::Closed)?;
        let written = device.write(&bytes)?;
        if written != bytes.len() {
            return Err(DeviceError::WriteFailed(format!(
                "{}: short write, {written} of {} bytes",
                self.info.path,
                bytes.len()
            )));
        }
        log::debug!("wrote {} to {}", self.word, self.info.path);
        Ok(())
    }

    fn write_through(&mut self) -> Result<()> {
        if self.immediate && self.depth == 0 {
            self.update()
        } else {
            Ok(())
        }
    }

    pub fn get(&self, field: Field) -> u32 {
        self.word.get(field)
    }

    /// Store `value` (truncated to the field width) and push it to the device.
    pub fn set(&mut self, field: Field, value: u32) -> Result<()> {
        self.word.set(field, value);
        self.write_through()
    }

    /// Whether mutations are written through. Reads false inside a paused scope.
    pub fn immediate(&self) -> bool {
        self.immediate
    }

    pub fn set_immediate(&mut self, immediate: bool) {
        self.immediate = immediate;
    }

    /// Restore defaults. With `flush`, write the result even if updates are held back.
    pub fn reset(&mut self, flush: bool) -> Result<()> {
        self.word.reset();
        if flush {
            self.update()
        } else {
            self.write_through()
        }
    }

    pub fn status(&self) -> Status {
        self.word.status()
    }

    // ── Derived properties ──

    pub fn color(&self) -> Color {
        Color {
            red: self.get(Field::Red) as u8,
            blue: self.get(Field::Blue) as u8,
            green: self.get(Field::Green) as u8,
        }
    }

    /// Set red, blue and green as one device write.
    pub fn set_color(&mut self, color: impl Into<Color>) -> Result<()> {
        let color = color.into();
        let mut paused = self.updates_paused();
        paused.set(Field::Red, color.red.into())?;
        paused.set(Field::Blue, color.blue.into())?;
        paused.set(Field::Green, color.green.into())?;
        paused.resume()
    }

    pub fn off(&self) -> bool {
        self.get(Field::Off) != 0
    }

    pub fn set_off(&mut self, off: bool) -> Result<()> {
        self.set(Field::Off, off.into())
    }

    pub fn on(&self) -> bool {
        !self.off()
    }

    pub fn set_on(&mut self, on: bool) -> Result<()> {
        self.set_off(!on)
    }

    pub fn dim(&self) -> bool {
        self.get(Field::Dim) != 0
    }

    pub fn set_dim(&mut self, dim: bool) -> Result<()> {
        self.set(Field::Dim, dim.into())
    }

    pub fn bright(&self) -> bool {
        !self.dim()
    }

    pub fn set_bright(&mut self, bright: bool) -> Result<()> {
        self.set_dim(!bright)
    }

    // ── Name-based access ──

    /// Read a field or derived property by name.
    ///
    /// Besides the raw fields, accepts `on`, `bright`, `immediate` and
    /// `color` (packed `0xRRBBGG`).
    pub fn get_by_name(&self, name: &str) -> crate::error::Result<u32> {
        let value = match name.trim().to_lowercase().as_str() {
            "on" => self.on().into(),
            "bright" => self.bright().into(),
            "immediate" => self.immediate().into(),
            "color" => self.color().packed(),
            other => self.get(other.parse()?),
        };
        Ok(value)
    }

    /// Write a field or derived property by name. See [`Self::get_by_name`].
    pub fn set_by_name(&mut self, name: &str, value: u32) -> crate::error::Result<()> {
        match name.trim().to_lowercase().as_str() {
            "on" => self.set_on(value != 0)?,
            "bright" => self.set_bright(value != 0)?,
            "immediate" => self.set_immediate(value != 0),
            "color" => self.set_color(value)?,
            other => {
                let field: Field = other.parse()?;
                self.set(field, value)?;
            }
        }
        Ok(())
    }

    // ── Paused updates ──

    /// Hold device writes until the returned guard ends.
    ///
    /// Scopes nest; only the outermost one writes. `immediate` reads false
    /// while any scope is open and is restored when the outermost ends.
    pub fn updates_paused(&mut self) -> PausedUpdates<'_, D> {
        if self.depth == 0 {
            self.saved_immediate = self.immediate;
            self.immediate = false;
        }
        self.depth += 1;
        PausedUpdates {
            light: self,
            finished: false,
        }
    }

    /// Run `f` with updates paused, then write once.
    ///
    /// An error from `f` wins over a write error; the scope is closed either way.
    pub fn with_updates_paused<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<DeviceError>,
    {
        let mut paused = self.updates_paused();
        let result = f(&mut *paused);
        let flushed = paused.resume();
        let value = result?;
        flushed?;
        Ok(value)
    }

    fn end_pause(&mut self, flush: bool) -> Result<()> {
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 {
            return Ok(());
        }
        self.immediate = self.saved_immediate;
        if flush { self.update() } else { Ok(()) }
    }
}

impl<D: HidDevice> Drop for BlyncLight<D> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<D: HidDevice> std::fmt::Debug for BlyncLight<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlyncLight")
            .field("info", &self.info)
            .field("open", &self.is_open())
            .field("immediate", &self.immediate)
            .field("depth", &self.depth)
            .field("word", &self.word)
            .finish()
    }
}

impl<D: HidDevice> PartialEq<CommandWord> for BlyncLight<D> {
    fn eq(&self, other: &CommandWord) -> bool {
        &self.word == other
    }
}

/// Scope guard returned by [`BlyncLight::updates_paused`].
///
/// Dereferences to the light. End it with [`resume`](Self::resume) to get the
/// write result; dropping it also ends the scope and writes, but can only log
/// a failure.
#[must_use = "dropping the guard immediately resumes updates"]
pub struct PausedUpdates<'a, D: HidDevice> {
    light: &'a mut BlyncLight<D>,
    finished: bool,
}

impl<D: HidDevice> PausedUpdates<'_, D> {
    /// End the scope, writing once if it was the outermost.
    pub fn resume(mut self) -> Result<()> {
        self.finished = true;
        self.light.end_pause(true)
    }

    /// End the scope without writing.
    pub fn resume_without_flush(mut self) {
        self.finished = true;
        // Cannot fail without a write.
        let _ = self.light.end_pause(false);
    }
}

impl<D: HidDevice> Deref for PausedUpdates<'_, D> {
    type Target = BlyncLight<D>;

    fn deref(&self) -> &Self::Target {
        self.light
    }
}

impl<D: HidDevice> DerefMut for PausedUpdates<'_, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.light
    }
}

impl<D: HidDevice> Drop for PausedUpdates<'_, D> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.light.end_pause(true) {
            log::warn!("flush after paused updates failed: {e}");
        }
    }
}

const DERIVED_NAMES: [&str; 4] = ["on", "bright", "immediate", "color"];

/// Validate a name for [`BlyncLight::set_by_name`] without a device.
pub fn check_name(name: &str) -> std::result::Result<(), CommandError> {
    let lower = name.trim().to_lowercase();
    if DERIVED_NAMES.contains(&lower.as_str()) {
        return Ok(());
    }
    lower.parse::<Field>().map(|_| ())
}
