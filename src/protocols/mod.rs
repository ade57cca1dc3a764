use mojo::MojoCommand;

pub mod mojo;

/// What to do with the board. Selected once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Erase,
    ProgramRam,
    ProgramFlash { verify: bool },
}

impl Operation {
    /// Command that opens a program operation, `None` for erase
    pub(crate) fn mode_select(self) -> Option<MojoCommand> {
        match self {
            Operation::Erase => None,
            Operation::ProgramRam => Some(MojoCommand::ProgramRam),
            Operation::ProgramFlash { verify: false } => Some(MojoCommand::ProgramFlash),
            Operation::ProgramFlash { verify: true } => Some(MojoCommand::ProgramFlashVerify),
        }
    }

    pub(crate) fn verifies(self) -> bool {
        matches!(self, Operation::ProgramFlash { verify: true })
    }

    /// RAM programming is live as soon as the data is acknowledged
    pub(crate) fn loads_from_flash(self) -> bool {
        matches!(self, Operation::ProgramFlash { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_select_bytes() {
        assert_eq!(Operation::Erase.mode_select(), None);
        assert_eq!(Operation::ProgramRam.mode_select().map(|m| m as u8), Some(b'R'));
        assert_eq!(
            Operation::ProgramFlash { verify: false }
                .mode_select()
                .map(|m| m as u8),
            Some(b'F')
        );
        assert_eq!(
            Operation::ProgramFlash { verify: true }
                .mode_select()
                .map(|m| m as u8),
            Some(b'V')
        );
    }

    #[test]
    fn test_ram_never_verifies_or_loads() {
        assert!(!Operation::ProgramRam.verifies());
        assert!(!Operation::ProgramRam.loads_from_flash());
        assert!(!Operation::ProgramFlash { verify: false }.verifies());
        assert!(Operation::ProgramFlash { verify: false }.loads_from_flash());
        assert!(Operation::ProgramFlash { verify: true }.verifies());
    }
}
