use crate::core::{ExtendedLabel, Label, Sdi};
use crate::utils::Bitmap;

const EXT_LABEL_WORDS: usize = ExtendedLabel::COUNT / 32;
const LABEL_WORDS: usize = 256 / 32;

/// Length of the chip label filter memory
pub const HARDWARE_FILTER_LENGTH: usize = 32;

/// Software and hardware label filters of one channel
///
/// The software map routes an extended label to a frame buffer. The hardware map is the set of
/// labels the chip admits into its FIFO; a label stays admitted while any of its SDI variants
/// has a software filter.
pub struct FilterTable {
    assigned: Bitmap<EXT_LABEL_WORDS>,
    buffer: [u8; ExtendedLabel::COUNT],
    hardware: Bitmap<LABEL_WORDS>,
}

impl FilterTable {
    pub fn new() -> Self {
        Self {
            assigned: Bitmap::new(),
            buffer: [0; ExtendedLabel::COUNT],
            hardware: Bitmap::new(),
        }
    }

    pub fn lookup(&self, ext: ExtendedLabel) -> Option<u8> {
        let key = usize::from(ext);
        self.assigned.get(key).then_some(self.buffer[key])
    }

    pub fn assign(&mut self, ext: ExtendedLabel, buffer: u8) {
        let key = usize::from(ext);
        self.assigned.set(key);
        self.buffer[key] = buffer;
        self.hardware.set(usize::from(ext.label()));
    }

    /// Removes a filter, returning the buffer it routed to
    pub fn remove(&mut self, ext: ExtendedLabel) -> Option<u8> {
        let buffer = self.lookup(ext)?;
        self.assigned.clear(usize::from(ext));
        let label = ext.label();
        let in_use = Sdi::all()
            .iter()
            .any(|&sdi| self.lookup(ExtendedLabel::new(label, sdi)).is_some());
        self.hardware.assign(usize::from(label), in_use);
        Some(buffer)
    }

    pub fn admits(&self, label: Label) -> bool {
        self.hardware.get(usize::from(label))
    }

    pub fn len(&self) -> usize {
        self.assigned.count()
    }

    pub fn clear(&mut self) {
        self.assigned.clear_all();
        self.hardware.clear_all();
    }

    /// Label filter memory image, first byte covers labels 0xff..=0xf8 with the highest in bit 7
    pub fn hardware_image(&self) -> [u8; HARDWARE_FILTER_LENGTH] {
        let words = self.hardware.words();
        core::array::from_fn(|position| {
            let group = HARDWARE_FILTER_LENGTH - 1 - position;
            (words[group / 4] >> ((group % 4) * 8)) as u8
        })
    }
}

impl Default for FilterTable {
    fn default() -> Self {
        Self::new()
    }
}
