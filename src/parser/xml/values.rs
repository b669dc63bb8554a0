use super::{parse_document, XmlError};
use tracing::debug;

/// A simple resource definition: `<dimen name="x">10dp</dimen>` or
/// `<item type="dimen" name="x">10dp</item>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDefinition {
    /// Resource type as written (`dimen`, `string`, `style`, ...)
    pub resource_type: String,
    pub name: String,
    pub value: String,
}

/// An `<item>` child of a `<style>` element, binding a theme attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleItem {
    /// Attribute name as written, possibly package-qualified (`android:colorAccent`)
    pub attribute: String,
    pub value: String,
}

/// Raw, unresolved definitions found in one values file
#[derive(Debug, Default)]
pub struct ValueDefinitions {
    pub values: Vec<ValueDefinition>,
    pub style_items: Vec<StyleItem>,
}

/// Parser for `res/values*/*.xml` files
pub struct ValuesParser;

impl ValuesParser {
    pub fn new() -> Self {
        Self
    }

    /// Collect every definition below the `<resources>` root.
    ///
    /// Type filtering happens later when the definitions are stored, so
    /// unknown resource types are returned as well.
    pub fn parse(&self, contents: &str) -> Result<ValueDefinitions, XmlError> {
        let root = parse_document(contents)?;
        let mut result = ValueDefinitions::default();

        for element in root.child_elements() {
            let name = element.attribute("name").unwrap_or_default().to_string();

            let resource_type = if element.name == "item" {
                element.attribute("type").unwrap_or_default()
            } else {
                element.name.as_str()
            };

            if resource_type == "style" {
                for item in element.child_elements().filter(|c| c.name == "item") {
                    result.style_items.push(StyleItem {
                        attribute: item.attribute("name").unwrap_or_default().to_string(),
                        value: item.text_content().trim().to_string(),
                    });
                }
                continue;
            }

            result.values.push(ValueDefinition {
                resource_type: resource_type.to_string(),
                name,
                value: element.text_content().trim().to_string(),
            });
        }

        debug!(
            "Parsed {} value definitions and {} style items",
            result.values.len(),
            result.style_items.len()
        );

        Ok(result)
    }
}

impl Default for ValuesParser {
    fn default() -> Self {
        Self::new()
    }
}
