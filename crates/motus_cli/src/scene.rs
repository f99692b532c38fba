//! Headless stand-in for a scene graph
//!
//! Objects live behind `Rc<RefCell<..>>` and are owned only by the [`Scene`],
//! so removing one leaves every tween that targets it with a dangling weak
//! reference.

use crate::config::ObjectConfig;
use crate::error::{ChoreographyError, Result};
use indexmap::IndexMap;
use motus_animation::{Property, Rgb, TargetId};
use std::cell::RefCell;
use std::rc::Rc;

pub type SharedObject = Rc<RefCell<SceneObject>>;
pub type SharedColor = Rc<RefCell<Rgb>>;

/// Named numeric fields and colors of one object
#[derive(Debug, Default)]
pub struct SceneObject {
    pub fields: IndexMap<String, f32>,
    /// Each color is its own target so color tweens can be killed separately
    pub colors: IndexMap<String, SharedColor>,
}

impl SceneObject {
    fn from_config(config: &ObjectConfig) -> Self {
        Self {
            fields: config.fields.clone(),
            colors: config
                .colors
                .iter()
                .map(|(name, color)| (name.clone(), Rc::new(RefCell::new(*color))))
                .collect(),
        }
    }
}

/// Animation target named by a choreography path
#[derive(Debug, Clone)]
pub enum TargetRef {
    Object(SharedObject),
    Color(SharedColor),
}

impl TargetRef {
    pub fn id(&self) -> TargetId {
        match self {
            TargetRef::Object(object) => TargetId::of(object),
            TargetRef::Color(color) => TargetId::of(color),
        }
    }
}

/// All objects of a choreography, in declaration order
#[derive(Debug, Default)]
pub struct Scene {
    objects: IndexMap<String, SharedObject>,
}

impl Scene {
    pub fn new(objects: &IndexMap<String, ObjectConfig>) -> Self {
        Self {
            objects: objects
                .iter()
                .map(|(name, config)| {
                    (
                        name.clone(),
                        Rc::new(RefCell::new(SceneObject::from_config(config))),
                    )
                })
                .collect(),
        }
    }

    pub fn object(&self, name: &str) -> Result<&SharedObject> {
        self.objects
            .get(name)
            .ok_or_else(|| ChoreographyError::UnknownObject(name.to_string()))
    }

    /// Writable numeric field of an object
    pub fn field(&self, object: &str, field: &str) -> Result<Property> {
        let shared = self.object(object)?;
        if !shared.borrow().fields.contains_key(field) {
            return Err(ChoreographyError::UnknownField {
                object: object.to_string(),
                field: field.to_string(),
            });
        }
        let key = field.to_string();
        Ok(Property::optional(
            shared,
            field.to_string(),
            move |o: &mut SceneObject| o.fields.get_mut(&key),
        ))
    }

    /// Field named by an `object.field` path
    pub fn field_at(&self, path: &str) -> Result<Property> {
        let (object, field) = split_path(path)?;
        self.field(object, field)
    }

    /// Color named by an `object.color` path
    pub fn color_at(&self, path: &str) -> Result<SharedColor> {
        let (object, color) = split_path(path)?;
        let shared = self.object(object)?;
        let found = shared.borrow().colors.get(color).cloned();
        found.ok_or_else(|| ChoreographyError::UnknownColor {
            object: object.to_string(),
            color: color.to_string(),
        })
    }

    /// `object` or `object.color`
    pub fn target(&self, path: &str) -> Result<TargetRef> {
        match path.split_once('.') {
            None => Ok(TargetRef::Object(self.object(path)?.clone())),
            Some(_) => Ok(TargetRef::Color(self.color_at(path)?)),
        }
    }

    /// Drop an object; tweens targeting it are cancelled on their next tick
    pub fn remove(&mut self, name: &str) -> bool {
        self.objects.shift_remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Current value at `object.field` or `object.color.channel`
    pub fn read(&self, path: &str) -> Option<f32> {
        let (object, rest) = path.split_once('.')?;
        let object = self.objects.get(object)?.try_borrow().ok()?;
        if let Some(value) = object.fields.get(rest) {
            return Some(*value);
        }
        let (color, channel) = rest.rsplit_once('.')?;
        let color = *object.colors.get(color)?.try_borrow().ok()?;
        match channel {
            "r" => Some(color.r),
            "g" => Some(color.g),
            "b" => Some(color.b),
            _ => None,
        }
    }

    /// Every field and color channel as `path -> value`
    pub fn snapshot(&self) -> IndexMap<String, f32> {
        let mut values = IndexMap::new();
        for (name, object) in &self.objects {
            let Ok(object) = object.try_borrow() else {
                continue;
            };
            for (field, value) in &object.fields {
                values.insert(format!("{name}.{field}"), *value);
            }
            for (color_name, color) in &object.colors {
                let Ok(color) = color.try_borrow() else {
                    continue;
                };
                for (channel, value) in ["r", "g", "b"].into_iter().zip(color.to_array()) {
                    values.insert(format!("{name}.{color_name}.{channel}"), value);
                }
            }
        }
        values
    }
}

/// Split `object.rest` at the first dot
pub fn split_path(path: &str) -> Result<(&str, &str)> {
    match path.split_once('.') {
        Some((object, rest)) if !object.is_empty() && !rest.is_empty() => Ok((object, rest)),
        _ => Err(ChoreographyError::InvalidPath(path.to_string())),
    }
}
