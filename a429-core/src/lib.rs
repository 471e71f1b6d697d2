//! ARINC429 bridge core data types
//!
//! This crate provides basic data type definitions used by other bridge crates.
//! Every type carries the numeric encoding used on the host protocol.
//! Bridge users should not depend on this crate directly. Use `a429::core` reexport instead.
#![no_std]

use core::ops::Range;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidValue;

/// Number of transmit channels, given by the transceiver
pub const TX_CHANNEL_COUNT: usize = 1;
/// Number of receive channels, given by the transceiver
pub const RX_CHANNEL_COUNT: usize = 2;
pub const CHANNEL_COUNT: usize = TX_CHANNEL_COUNT + RX_CHANNEL_COUNT;

/// ARINC429 label
///
/// Occupies the low byte of a frame in host byte order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Label(u8);

impl Label {
    pub const MASK: u32 = 0xff;

    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    pub const fn from_frame(frame: u32) -> Self {
        Self((frame & Self::MASK) as u8)
    }

    pub const fn into_u8(self) -> u8 {
        self.0
    }

    /// All 256 label values in ascending order
    pub fn all() -> impl Iterator<Item = Label> {
        (0..=u8::MAX).map(Label)
    }
}

impl From<u8> for Label {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Label> for u8 {
    fn from(value: Label) -> Self {
        value.0
    }
}

impl From<Label> for usize {
    fn from(value: Label) -> Self {
        value.0.into()
    }
}

/// Source/destination identifier
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Sdi {
    Sdi0 = 0,
    Sdi1 = 1,
    Sdi2 = 2,
    Sdi3 = 3,
}

static SDI_VALUES: [Sdi; 4] = [Sdi::Sdi0, Sdi::Sdi1, Sdi::Sdi2, Sdi::Sdi3];

impl Sdi {
    pub const MAX: Sdi = Sdi::Sdi3;

    pub const fn try_from_u8(code: u8) -> Option<Sdi> {
        if code <= Self::MAX.into_u8() {
            Some(Self::from_u8_truncating(code))
        } else {
            None
        }
    }

    pub const fn from_u8_truncating(code: u8) -> Sdi {
        match code & 0x3 {
            0 => Sdi::Sdi0,
            1 => Sdi::Sdi1,
            2 => Sdi::Sdi2,
            3 => Sdi::Sdi3,
            _ => unreachable!(),
        }
    }

    pub const fn into_u8(self) -> u8 {
        self as u8
    }

    pub fn all() -> &'static [Sdi] {
        &SDI_VALUES
    }
}

impl TryFrom<u8> for Sdi {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from_u8(value).ok_or(InvalidValue)
    }
}

/// Interpretation of the SDI bits of a filtered label
///
/// `Data` means the SDI bits carry payload, so a single filter must match all four SDI values.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SdiMode {
    Address(Sdi),
    Data,
}

impl SdiMode {
    const DATA_CODE: u8 = 4;

    pub const fn try_from_u8(code: u8) -> Option<SdiMode> {
        if code == Self::DATA_CODE {
            return Some(SdiMode::Data);
        }
        match Sdi::try_from_u8(code) {
            Some(sdi) => Some(SdiMode::Address(sdi)),
            None => None,
        }
    }

    pub const fn into_u8(self) -> u8 {
        match self {
            SdiMode::Address(sdi) => sdi.into_u8(),
            SdiMode::Data => Self::DATA_CODE,
        }
    }

    /// Concrete SDI values matched by this mode
    pub fn sdis(self) -> &'static [Sdi] {
        match self {
            SdiMode::Address(sdi) => core::slice::from_ref(&SDI_VALUES[usize::from(sdi.into_u8())]),
            SdiMode::Data => &SDI_VALUES,
        }
    }
}

impl TryFrom<u8> for SdiMode {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from_u8(value).ok_or(InvalidValue)
    }
}

/// Label with SDI address extension
///
/// Occupies the low ten bits of a frame in host byte order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExtendedLabel(u16);

impl ExtendedLabel {
    pub const MASK: u32 = 0x3ff;
    /// Number of distinct extended labels
    pub const COUNT: usize = 1024;

    const SDI_POS: u16 = 8;

    pub const fn new(label: Label, sdi: Sdi) -> Self {
        Self((sdi.into_u8() as u16) << Self::SDI_POS | label.into_u8() as u16)
    }

    pub const fn try_from_u16(code: u16) -> Option<Self> {
        if code as u32 <= Self::MASK {
            Some(Self(code))
        } else {
            None
        }
    }

    pub const fn from_frame(frame: u32) -> Self {
        Self((frame & Self::MASK) as u16)
    }

    pub const fn label(self) -> Label {
        Label::new(self.0 as u8)
    }

    pub const fn sdi(self) -> Sdi {
        Sdi::from_u8_truncating((self.0 >> Self::SDI_POS) as u8)
    }

    pub const fn into_u16(self) -> u16 {
        self.0
    }
}

impl From<ExtendedLabel> for usize {
    fn from(value: ExtendedLabel) -> Self {
        value.0.into()
    }
}

impl TryFrom<u16> for ExtendedLabel {
    type Error = InvalidValue;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::try_from_u16(value).ok_or(InvalidValue)
    }
}

macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $code,)+
        }

        impl $name {
            pub const fn try_from_u8(code: u8) -> Option<$name> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub const fn into_u8(self) -> u8 {
                self as u8
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                value.into_u8()
            }
        }

        impl TryFrom<u8> for $name {
            type Error = InvalidValue;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                Self::try_from_u8(value).ok_or(InvalidValue)
            }
        }
    };
}

code_enum! {
    /// Use of the 32nd frame bit
    pub enum Parity {
        /// Parity bit carries data or a parity provided by the user
        Data = 0,
        /// Parity bit is generated on transmit and checked on receive
        Auto = 1,
    }
}

code_enum! {
    /// Wire speed
    pub enum Speed {
        /// 100 kbit/s
        High = 0,
        /// 12.5 kbit/s
        Low = 1,
    }
}

code_enum! {
    /// Channel operating mode
    pub enum ChannelMode {
        /// Initialized but inactive. TX output stage is in high impedance.
        Passive = 0,
        /// RX channels receive, TX channels accept direct transmits
        Active = 1,
        /// TX channels only: active with the scheduler running
        Run = 2,
    }
}

code_enum! {
    /// Callback generation policy
    pub enum CallbackMode {
        Off = 0,
        On = 1,
        /// Only when the reported value changed
        OnChange = 2,
    }
}

impl CallbackMode {
    pub const fn from_flags(enabled: bool, value_has_to_change: bool) -> Self {
        match (enabled, value_has_to_change) {
            (false, _) => CallbackMode::Off,
            (true, false) => CallbackMode::On,
            (true, true) => CallbackMode::OnChange,
        }
    }

    pub const fn enabled(self) -> bool {
        !matches!(self, CallbackMode::Off)
    }

    pub const fn value_has_to_change(self) -> bool {
        matches!(self, CallbackMode::OnChange)
    }
}

code_enum! {
    /// Reason for a callback message
    pub enum FrameStatus {
        /// First frame received, or first frame after a timeout
        New = 0,
        Update = 1,
        /// Frame is overdue, the message carries the last frame received
        Timeout = 2,
        Scheduler = 3,
        Statistics = 4,
    }
}

code_enum! {
    /// TX scheduler job code
    ///
    /// The numeric order is significant: codes from `Return` upward honor the dwell time.
    pub enum JobCode {
        /// Unused table entry
        Skip = 0,
        /// Send a scheduler callback with the entry index field as user data
        Callback = 1,
        /// Stop the scheduler, leaving the channel active
        Stop = 2,
        /// Continue at the entry index field, remembering the current position
        Jump = 3,
        /// Continue after the last jump
        Return = 4,
        /// Wait without transmitting
        Dwell = 5,
        /// Transmit a frame once per write
        Single = 6,
        /// Transmit a frame on every pass
        Cyclic = 7,
        /// Transmit the latest frame received on RX1
        RetransmitRx1 = 8,
        /// Transmit the latest frame received on RX2
        RetransmitRx2 = 9,
    }
}

impl JobCode {
    pub const fn uses_dwell_time(self) -> bool {
        self.into_u8() >= JobCode::Return.into_u8()
    }

    pub const fn transmits(self) -> bool {
        self.into_u8() >= JobCode::Single.into_u8()
    }

    /// RX channel a retransmit job reads from
    pub const fn retransmit_source(self) -> Option<RxChannel> {
        match self {
            JobCode::RetransmitRx1 => Some(RxChannel::RX1),
            JobCode::RetransmitRx2 => Some(RxChannel::RX2),
            _ => None,
        }
    }
}

code_enum! {
    /// Transmit eligibility of a scheduled frame
    pub enum FrameMode {
        /// Transmit the frame, or re-arm a single transmit
        Transmit = 0,
        Mute = 1,
    }
}

code_enum! {
    /// Bridge-wide operation selector
    pub enum A429Mode {
        /// High-level A429 operations are executed
        Normal = 0,
        /// High-level A429 operations are stopped for low-level register access
        Debug = 1,
    }
}

/// Transmit channel index
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxChannel(u8);

impl TxChannel {
    pub const TX1: TxChannel = TxChannel(0);

    const CODE_BASE: u8 = 1;

    pub const fn new(index: usize) -> Option<Self> {
        if index < TX_CHANNEL_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Host protocol channel code
    pub const fn code(self) -> u8 {
        Self::CODE_BASE + self.0
    }

    pub fn all() -> impl Iterator<Item = TxChannel> {
        (0..TX_CHANNEL_COUNT as u8).map(TxChannel)
    }
}

/// Receive channel index
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxChannel(u8);

impl RxChannel {
    pub const RX1: RxChannel = RxChannel(0);
    pub const RX2: RxChannel = RxChannel(1);

    const CODE_BASE: u8 = 33;

    pub const fn new(index: usize) -> Option<Self> {
        if index < RX_CHANNEL_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Host protocol channel code
    pub const fn code(self) -> u8 {
        Self::CODE_BASE + self.0
    }

    pub fn all() -> impl Iterator<Item = RxChannel> {
        (0..RX_CHANNEL_COUNT as u8).map(RxChannel)
    }
}

/// A specific channel of either direction
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Tx(TxChannel),
    Rx(RxChannel),
}

impl Channel {
    /// Position in per-channel tables: TX channels first, then RX channels
    pub const fn flat_index(self) -> usize {
        match self {
            Channel::Tx(tx) => tx.index(),
            Channel::Rx(rx) => TX_CHANNEL_COUNT + rx.index(),
        }
    }

    pub const fn from_flat_index(index: usize) -> Option<Self> {
        if index < TX_CHANNEL_COUNT {
            Some(Channel::Tx(TxChannel(index as u8)))
        } else if index < CHANNEL_COUNT {
            Some(Channel::Rx(RxChannel((index - TX_CHANNEL_COUNT) as u8)))
        } else {
            None
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Channel::Tx(tx) => tx.code(),
            Channel::Rx(rx) => rx.code(),
        }
    }
}

/// Channel selector of a host command
///
/// Group selectors address every channel of one direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelSelector {
    AllTx,
    Tx(TxChannel),
    AllRx,
    Rx(RxChannel),
}

impl ChannelSelector {
    const ALL_TX_CODE: u8 = 0;
    const ALL_RX_CODE: u8 = 32;

    pub const fn try_from_u8(code: u8) -> Option<Self> {
        if code == Self::ALL_TX_CODE {
            return Some(ChannelSelector::AllTx);
        }
        if code == Self::ALL_RX_CODE {
            return Some(ChannelSelector::AllRx);
        }
        if code >= TxChannel::CODE_BASE && code < Self::ALL_RX_CODE {
            if let Some(tx) = TxChannel::new((code - TxChannel::CODE_BASE) as usize) {
                return Some(ChannelSelector::Tx(tx));
            }
        }
        if code >= RxChannel::CODE_BASE {
            if let Some(rx) = RxChannel::new((code - RxChannel::CODE_BASE) as usize) {
                return Some(ChannelSelector::Rx(rx));
            }
        }
        None
    }

    pub const fn into_u8(self) -> u8 {
        match self {
            ChannelSelector::AllTx => Self::ALL_TX_CODE,
            ChannelSelector::Tx(tx) => tx.code(),
            ChannelSelector::AllRx => Self::ALL_RX_CODE,
            ChannelSelector::Rx(rx) => rx.code(),
        }
    }

    /// Selected TX channel indices, `None` for RX selectors
    pub const fn tx_range(self) -> Option<Range<usize>> {
        match self {
            ChannelSelector::AllTx => Some(0..TX_CHANNEL_COUNT),
            ChannelSelector::Tx(tx) => Some(tx.index()..tx.index() + 1),
            _ => None,
        }
    }

    /// Selected RX channel indices, `None` for TX selectors
    pub const fn rx_range(self) -> Option<Range<usize>> {
        match self {
            ChannelSelector::AllRx => Some(0..RX_CHANNEL_COUNT),
            ChannelSelector::Rx(rx) => Some(rx.index()..rx.index() + 1),
            _ => None,
        }
    }

    /// The addressed channel if the selector names exactly one
    pub const fn single(self) -> Option<Channel> {
        match self {
            ChannelSelector::Tx(tx) => Some(Channel::Tx(tx)),
            ChannelSelector::Rx(rx) => Some(Channel::Rx(rx)),
            ChannelSelector::AllTx | ChannelSelector::AllRx => None,
        }
    }
}

impl From<Channel> for ChannelSelector {
    fn from(value: Channel) -> Self {
        match value {
            Channel::Tx(tx) => ChannelSelector::Tx(tx),
            Channel::Rx(rx) => ChannelSelector::Rx(rx),
        }
    }
}

impl TryFrom<u8> for ChannelSelector {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from_u8(value).ok_or(InvalidValue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_label_layout() {
        let ext = ExtendedLabel::new(Label::new(0x13), Sdi::Sdi2);
        assert_eq!(ext.into_u16(), 0x213);
        assert_eq!(ext.label(), Label::new(0x13));
        assert_eq!(ext.sdi(), Sdi::Sdi2);

        let frame = 0x6000_0313;
        assert_eq!(ExtendedLabel::from_frame(frame).into_u16(), 0x313);
        assert_eq!(Label::from_frame(frame), Label::new(0x13));
        assert!(ExtendedLabel::try_from_u16(0x400).is_none());
    }

    #[test]
    fn test_sdi_mode() {
        assert_eq!(SdiMode::try_from_u8(4), Some(SdiMode::Data));
        assert_eq!(SdiMode::try_from_u8(1), Some(SdiMode::Address(Sdi::Sdi1)));
        assert!(SdiMode::try_from_u8(5).is_none());
        assert_eq!(SdiMode::Data.sdis().len(), 4);
        assert_eq!(SdiMode::Address(Sdi::Sdi3).sdis(), &[Sdi::Sdi3]);
    }

    #[test]
    fn test_channel_selector_codes() {
        assert_eq!(ChannelSelector::try_from_u8(0), Some(ChannelSelector::AllTx));
        assert_eq!(
            ChannelSelector::try_from_u8(1),
            Some(ChannelSelector::Tx(TxChannel::TX1))
        );
        assert_eq!(ChannelSelector::try_from_u8(32), Some(ChannelSelector::AllRx));
        assert_eq!(
            ChannelSelector::try_from_u8(34),
            Some(ChannelSelector::Rx(RxChannel::RX2))
        );
        for code in [2, 31, 35, 255] {
            assert!(ChannelSelector::try_from_u8(code).is_none());
        }
        for code in [0, 1, 32, 33, 34] {
            assert_eq!(ChannelSelector::try_from_u8(code).unwrap().into_u8(), code);
        }
    }

    #[test]
    fn test_channel_selector_ranges() {
        assert_eq!(ChannelSelector::AllRx.rx_range(), Some(0..2));
        assert_eq!(ChannelSelector::Rx(RxChannel::RX2).rx_range(), Some(1..2));
        assert_eq!(ChannelSelector::AllRx.tx_range(), None);
        assert_eq!(ChannelSelector::AllTx.single(), None);
    }

    #[test]
    fn test_flat_index() {
        for index in 0..CHANNEL_COUNT {
            let channel = Channel::from_flat_index(index).unwrap();
            assert_eq!(channel.flat_index(), index);
        }
        assert_eq!(Channel::Rx(RxChannel::RX1).flat_index(), 1);
        assert!(Channel::from_flat_index(CHANNEL_COUNT).is_none());
    }

    #[test]
    fn test_job_code_classes() {
        assert!(!JobCode::Skip.uses_dwell_time());
        assert!(!JobCode::Jump.uses_dwell_time());
        assert!(JobCode::Return.uses_dwell_time());
        assert!(JobCode::Dwell.uses_dwell_time());
        assert!(!JobCode::Dwell.transmits());
        assert!(JobCode::RetransmitRx2.transmits());
        assert_eq!(JobCode::RetransmitRx2.retransmit_source(), Some(RxChannel::RX2));
        assert!(JobCode::try_from_u8(10).is_none());
    }

    #[test]
    fn test_callback_mode_flags() {
        assert_eq!(CallbackMode::from_flags(false, true), CallbackMode::Off);
        assert_eq!(CallbackMode::from_flags(true, true), CallbackMode::OnChange);
        assert!(CallbackMode::On.enabled());
        assert!(!CallbackMode::On.value_has_to_change());
    }
}
