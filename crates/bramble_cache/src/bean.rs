//! Field-by-field encoding of beans.
//!
//! A bean is any model type without a dedicated codec. Instead of inspecting
//! the type at runtime, each bean type describes its relevant fields once,
//! in a [`BeanSchema`]: their names, typed accessors, an optional flag
//! telling whether the user set the field explicitly, and an optional marker
//! for field types the cache cannot fully restore. Schemas are computed on
//! first use and cached for the lifetime of the process.
//!
//! ```ignore
//! #[derive(Default)]
//! struct Compile {
//!     source_level: Option<String>,
//!     source_level_set: bool,
//! }
//!
//! impl Bean for Compile {
//!     fn describe(schema: &mut SchemaBuilder<Self>) {
//!         schema
//!             .field("source_level", |c| &c.source_level, |c, v| c.source_level = v)
//!             .explicit_flag(|c| c.source_level_set);
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use bramble_common::Object;
use bramble_diagnostics::{Problem, ProblemCode};
use bramble_model::{ConventionProvider, PatternSet};

use crate::codec::{downcast, Codec};
use crate::codecs::ObjectList;
use crate::context::{short_type_name, PropertyKind, ReadContext, SessionContext, WriteContext};
use crate::error::SerializationError;

/// A type encoded field by field.
pub trait Bean: Default + Send + Sync + 'static {
    /// Lists the relevant fields, in the order they are written.
    fn describe(schema: &mut SchemaBuilder<Self>);
}

/// The static type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclaredType {
    id: Option<TypeId>,
    name: &'static str,
}

impl DeclaredType {
    /// Exactly the type `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: Some(TypeId::of::<T>()),
            name: std::any::type_name::<T>(),
        }
    }

    /// Any type at all.
    pub fn any() -> Self {
        Self {
            id: None,
            name: "any",
        }
    }

    /// Returns `true` if a value of runtime type `runtime` can be assigned.
    pub fn accepts(&self, runtime: TypeId) -> bool {
        self.id.map_or(true, |id| id == runtime)
    }

    /// The name of the type.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A value a bean field can hold.
pub trait FieldValue: Sized + Send + Sync + 'static {
    /// The declared type of fields holding `Self`.
    fn declared_type() -> DeclaredType;

    /// The value to write, or `None` for null.
    fn to_object(&self) -> Option<Object>;

    /// Converts a decoded value back. `None` if it does not fit.
    fn from_object(value: Option<Object>) -> Option<Self>;
}

macro_rules! value_fields {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn declared_type() -> DeclaredType {
                    DeclaredType::of::<$ty>()
                }

                fn to_object(&self) -> Option<Object> {
                    Some(Object::new(self.clone()))
                }

                fn from_object(value: Option<Object>) -> Option<Self> {
                    value?.downcast_ref::<$ty>().cloned()
                }
            }
        )*
    };
}

value_fields!(
    String,
    bool,
    i32,
    i64,
    u32,
    u64,
    PathBuf,
    Vec<u8>,
    Vec<String>,
    PatternSet,
    ObjectList,
);

/// Optional fields are null when `None`.
impl<V: FieldValue> FieldValue for Option<V> {
    fn declared_type() -> DeclaredType {
        V::declared_type()
    }

    fn to_object(&self) -> Option<Object> {
        self.as_ref().and_then(V::to_object)
    }

    fn from_object(value: Option<Object>) -> Option<Self> {
        match value {
            None => Some(None),
            value => V::from_object(value).map(Some),
        }
    }
}

/// Shared fields keep their identity: every field holding a clone of the
/// same `Arc` decodes to one shared instance.
impl<T: Any + Send + Sync> FieldValue for Arc<T> {
    fn declared_type() -> DeclaredType {
        DeclaredType::of::<T>()
    }

    fn to_object(&self) -> Option<Object> {
        Some(Object::from_arc(Arc::clone(self)))
    }

    fn from_object(value: Option<Object>) -> Option<Self> {
        value?.downcast::<T>()
    }
}

impl FieldValue for Object {
    fn declared_type() -> DeclaredType {
        DeclaredType::any()
    }

    fn to_object(&self) -> Option<Object> {
        Some(self.clone())
    }

    fn from_object(value: Option<Object>) -> Option<Self> {
        value
    }
}

type Getter<T> = Box<dyn Fn(&T) -> Option<Object> + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, Option<Object>) -> bool + Send + Sync>;
type Flag<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// One field of a bean schema.
pub struct RelevantField<T> {
    name: &'static str,
    declared: DeclaredType,
    get: Getter<T>,
    set: Setter<T>,
    explicit: Option<Flag<T>>,
    unsupported: bool,
}

impl<T> RelevantField<T> {
    /// The field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The declared type of the field.
    pub fn declared_type(&self) -> DeclaredType {
        self.declared
    }

    /// Returns `true` if the field has an explicit-value flag.
    pub fn has_explicit_flag(&self) -> bool {
        self.explicit.is_some()
    }

    /// Returns `true` if the field's type is marked unsupported.
    pub fn is_unsupported(&self) -> bool {
        self.unsupported
    }

    /// Pairs the field with a flag telling whether the user set it.
    ///
    /// While the flag is `false`, the convention value of the field is
    /// written instead of the field itself, if it has the declared type.
    pub fn explicit_flag(&mut self, flag: impl Fn(&T) -> bool + Send + Sync + 'static) -> &mut Self {
        self.explicit = Some(Box::new(flag));
        self
    }

    /// Marks the field's type as one the cache cannot fully restore.
    ///
    /// The value is still written, after a warning is reported.
    pub fn unsupported(&mut self) -> &mut Self {
        self.unsupported = true;
        self
    }
}

/// Collects the relevant fields of a bean type.
pub struct SchemaBuilder<T> {
    fields: Vec<RelevantField<T>>,
}

impl<T: Bean> SchemaBuilder<T> {
    /// Adds a field read with `get` and restored with `set`.
    pub fn field<V: FieldValue>(
        &mut self,
        name: &'static str,
        get: impl Fn(&T) -> &V + Send + Sync + 'static,
        set: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> &mut RelevantField<T> {
        self.fields.push(RelevantField {
            name,
            declared: V::declared_type(),
            get: Box::new(move |bean| get(bean).to_object()),
            set: Box::new(move |bean, value| match V::from_object(value) {
                Some(value) => {
                    set(bean, value);
                    true
                }
                None => false,
            }),
            explicit: None,
            unsupported: false,
        });
        let index = self.fields.len() - 1;
        &mut self.fields[index]
    }
}

/// The relevant fields of a bean type, in write order.
pub struct BeanSchema<T> {
    type_name: &'static str,
    fields: Vec<RelevantField<T>>,
}

impl<T> BeanSchema<T> {
    /// Name of the bean type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The fields, in write order.
    pub fn fields(&self) -> &[RelevantField<T>] {
        &self.fields
    }
}

type SchemaCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

/// Returns the schema of `T`, computing it on first use.
///
/// A schema never changes once computed.
pub fn schema_of<T: Bean>() -> Arc<BeanSchema<T>> {
    static SCHEMAS: OnceLock<SchemaCache> = OnceLock::new();
    let schemas = SCHEMAS.get_or_init(SchemaCache::default);

    let cached = schemas
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&TypeId::of::<T>())
        .cloned();
    if let Some(schema) = cached.and_then(|s| s.downcast::<BeanSchema<T>>().ok()) {
        return schema;
    }

    let mut builder = SchemaBuilder { fields: Vec::new() };
    T::describe(&mut builder);
    let schema = Arc::new(BeanSchema {
        type_name: std::any::type_name::<T>(),
        fields: builder.fields,
    });
    tracing::debug!(
        bean = schema.type_name,
        fields = schema.fields.len(),
        "computed bean schema"
    );

    let winner = schemas
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(TypeId::of::<T>())
        .or_insert_with(|| schema.clone())
        .clone();
    winner.downcast::<BeanSchema<T>>().unwrap_or(schema)
}

/// Encodes a bean by its schema, preserving its identity.
pub struct BeanCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Bean> BeanCodec<T> {
    /// Creates the codec.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: Bean> Default for BeanCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Bean> Codec for BeanCodec<T> {
    fn encode(&self, ctx: &mut WriteContext<'_>, value: &Object) -> Result<(), SerializationError> {
        let bean = downcast::<T>(value)?;
        let schema = schema_of::<T>();
        ctx.encode_preserving_identity(value, |ctx| {
            for field in schema.fields() {
                write_field(ctx, &schema, field, value, bean)?;
            }
            Ok(())
        })
    }

    fn decode(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Object>, SerializationError> {
        let schema = schema_of::<T>();
        ctx.decode_preserving_identity(|ctx, _id| {
            let mut bean = T::default();
            for field in schema.fields() {
                read_field(ctx, &schema, field, &mut bean)?;
            }
            Ok(Object::new(bean))
        })
        .map(Some)
    }
}

fn write_field<T>(
    ctx: &mut WriteContext<'_>,
    schema: &BeanSchema<T>,
    field: &RelevantField<T>,
    owner: &Object,
    bean: &T,
) -> Result<(), SerializationError> {
    let value = value_to_write(ctx.conventions(), field, owner, bean);
    ctx.with_debug_frame(
        || format!("{}.{}", schema.type_name, field.name),
        |ctx| {
            ctx.with_property_trace(PropertyKind::Field, field.name, schema.type_name, |ctx| {
                if field.unsupported {
                    report_unsupported_field(ctx, value.as_ref())?;
                }
                ctx.write(value.as_ref())
            })
        },
    )
}

/// The raw field value, or its convention when the field was not set
/// explicitly and the convention fits the declared type.
fn value_to_write<T>(
    conventions: &dyn ConventionProvider,
    field: &RelevantField<T>,
    owner: &Object,
    bean: &T,
) -> Option<Object> {
    let raw = (field.get)(bean);
    match &field.explicit {
        Some(is_explicit) if !is_explicit(bean) => conventions
            .convention_value(owner, field.name)
            .filter(|convention| field.declared.accepts(convention.runtime_type()))
            .or(raw),
        _ => raw,
    }
}

fn report_unsupported_field(
    ctx: &mut WriteContext<'_>,
    value: Option<&Object>,
) -> Result<(), SerializationError> {
    let type_name = value.map_or("null", Object::type_name);
    let description = ctx.trace().description();
    tracing::warn!(property = %description, type_name, "unsupported field type");
    let problem = Problem::warning(
        ProblemCode::UNSUPPORTED_FIELD_TYPE,
        format!(
            "{description}: cannot serialize object of type '{type_name}', as these are not supported with the configuration cache"
        ),
        description,
    )
    .with_type(type_name);
    ctx.report_problem(problem)
}

fn read_field<T>(
    ctx: &mut ReadContext<'_>,
    schema: &BeanSchema<T>,
    field: &RelevantField<T>,
    bean: &mut T,
) -> Result<(), SerializationError> {
    let value = ctx.with_property_trace(PropertyKind::Field, field.name, schema.type_name, |ctx| {
        ctx.read()
    })?;
    let actual = value.as_ref().map(|v| v.type_name().to_string());
    if (field.set)(bean, value) {
        return Ok(());
    }
    let owner = short_type_name(schema.type_name);
    Err(match actual {
        None => SerializationError::NullValue {
            what: format!("field `{}` of `{owner}`", field.name),
        },
        Some(actual) => SerializationError::FieldType {
            owner,
            field: field.name.to_string(),
            expected: field.declared.name().to_string(),
            actual,
        },
    })
}
