//! `<cmis:allowableActions>` scope.

use quick_xml::events::BytesStart;

use super::DecodeError;
use super::extension::ExtensionScope;
use super::scope::{Decoded, ElementName, ScopeDecoder, Step, parse_bool};
use crate::atompub::constants::Namespace;
use crate::model::AllowableActions;

#[derive(Default)]
pub(crate) struct AllowableActionsScope {
    actions: AllowableActions,
}

impl AllowableActionsScope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScopeDecoder for AllowableActionsScope {
    fn open(&mut self, name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<(), DecodeError> {
        if !name.is_cmis(b"allowableActions") {
            return Err(DecodeError::MissingRequiredElement("allowableActions".to_string()));
        }
        Ok(())
    }

    fn start(&mut self, depth: usize, name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        if depth == 2 && name.ns == Namespace::Cmis {
            Ok(Step::Consume)
        } else {
            Ok(Step::Delegate(ExtensionScope::boxed()))
        }
    }

    fn end(&mut self, depth: usize, name: ElementName<'_>, text: &str) -> Result<(), DecodeError> {
        if depth != 2 {
            return Ok(());
        }
        let action = name.local_str();
        match parse_bool(text) {
            Some(allowed) => {
                self.actions.set(action, allowed);
                Ok(())
            },
            None => Err(DecodeError::InvalidPropertyValue {
                property_id: action,
                raw: text.to_string(),
            }),
        }
    }

    fn accept(&mut self, child: Decoded) -> Result<(), DecodeError> {
        if let Decoded::Extension(extension) = child {
            self.actions.extensions.push(extension);
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        Ok(Decoded::AllowableActions(self.actions))
    }
}
