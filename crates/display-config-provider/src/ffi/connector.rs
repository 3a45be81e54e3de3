use core::fmt;

/// The physical connector a display target is attached through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ConnectorType {
    Unknown,
    Vga,
    DviD,
    DviI,
    CvDongleNtsc,
    CvDongleJapan,
    CvDongleNonI2cJapan,
    CvDongleNonI2cNtsc,
    Proprietary,
    HdmiTypeA,
    HdmiTypeB,
    SVideo,
    Composite,
    Component,
    DisplayPort,
    EmbeddedDisplayPort,
    Wireless,
    UsbTypeC,
    /// A code the headers do not name.
    Other(i32),
}

impl ConnectorType {
    /// Maps an `ADL_DISPLAY_CONTYPE_*` code.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Unknown,
            1 => Self::Vga,
            2 => Self::DviD,
            3 => Self::DviI,
            4 => Self::CvDongleNtsc,
            5 => Self::CvDongleJapan,
            6 => Self::CvDongleNonI2cJapan,
            7 => Self::CvDongleNonI2cNtsc,
            8 => Self::Proprietary,
            10 => Self::HdmiTypeA,
            11 => Self::HdmiTypeB,
            12 => Self::SVideo,
            13 => Self::Composite,
            14 => Self::Component,
            15 => Self::DisplayPort,
            16 => Self::EmbeddedDisplayPort,
            17 => Self::Wireless,
            18 => Self::UsbTypeC,
            other => Self::Other(other),
        }
    }

    /// The `ADL_DISPLAY_CONTYPE_*` code.
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Vga => 1,
            Self::DviD => 2,
            Self::DviI => 3,
            Self::CvDongleNtsc => 4,
            Self::CvDongleJapan => 5,
            Self::CvDongleNonI2cJapan => 6,
            Self::CvDongleNonI2cNtsc => 7,
            Self::Proprietary => 8,
            Self::HdmiTypeA => 10,
            Self::HdmiTypeB => 11,
            Self::SVideo => 12,
            Self::Composite => 13,
            Self::Component => 14,
            Self::DisplayPort => 15,
            Self::EmbeddedDisplayPort => 16,
            Self::Wireless => 17,
            Self::UsbTypeC => 18,
            Self::Other(code) => code,
        }
    }

    /// Whether displays on this connector can report colour management (HDR) state.
    ///
    /// Analogue and DVI connectors cannot.
    pub fn reports_color_state(self) -> bool {
        !matches!(
            self,
            Self::Composite | Self::DviD | Self::DviI | Self::Component | Self::SVideo | Self::Vga
        )
    }

    /// Stable name used in display identifiers, `None` for codes the headers do not name.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::Unknown => "Unknown",
            Self::Vga => "VGA",
            Self::DviD => "DVI-D",
            Self::DviI => "DVI-I",
            Self::CvDongleNtsc => "CVDongle-NTSC",
            Self::CvDongleJapan => "CVDongle-JPN",
            Self::CvDongleNonI2cJapan => "CVDongle-NonI2C-JPN",
            Self::CvDongleNonI2cNtsc => "CVDongle-NonI2C-NTSC",
            Self::Proprietary => "Proprietary",
            Self::HdmiTypeA => "HDMI-A",
            Self::HdmiTypeB => "HDMI-B",
            Self::SVideo => "S-Video",
            Self::Composite => "Composite",
            Self::Component => "Component",
            Self::DisplayPort => "DisplayPort",
            Self::EmbeddedDisplayPort => "eDP",
            Self::Wireless => "Wireless",
            Self::UsbTypeC => "USB-C",
            Self::Other(_) => return None,
        };

        Some(name)
    }
}

impl fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Connector({})", self.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectorType;

    #[test]
    fn codes_round_trip() {
        for code in -2..24 {
            assert_eq!(ConnectorType::from_code(code).code(), code);
        }
    }

    #[test]
    fn color_state_skip_list() {
        let skipped = [1, 2, 3, 12, 13, 14];
        for code in 0..19 {
            let connector = ConnectorType::from_code(code);
            assert_eq!(
                connector.reports_color_state(),
                !skipped.contains(&code),
                "{connector}"
            );
        }
    }
}
