//! ONNX protobuf messages
//!
//! Hand-declared prost messages for the part of `onnx.proto` this crate
//! writes and reads. Field tags match the upstream schema, so the files are
//! readable by standard ONNX tooling; fields we never use are omitted and
//! skipped on decode.

/// `TensorProto.DataType` values.
pub mod data_type {
    /// 32-bit float
    pub const FLOAT: i32 = 1;
    /// 64-bit signed integer
    pub const INT64: i32 = 7;
    /// 64-bit float
    pub const DOUBLE: i32 = 11;
}

/// `AttributeProto.AttributeType` values.
pub mod attribute_type {
    /// Single float in `f`
    pub const FLOAT: i32 = 1;
    /// Single integer in `i`
    pub const INT: i32 = 2;
    /// Byte string in `s`
    pub const STRING: i32 = 3;
    /// Float list in `floats`
    pub const FLOATS: i32 = 6;
    /// Integer list in `ints`
    pub const INTS: i32 = 7;
}

/// Top-level model container.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModelProto {
    /// IR version of the file format
    #[prost(int64, tag = "1")]
    pub ir_version: i64,
    /// Tool that wrote the model
    #[prost(string, tag = "2")]
    pub producer_name: String,
    /// Version of the writing tool
    #[prost(string, tag = "3")]
    pub producer_version: String,
    /// Reverse-DNS model namespace
    #[prost(string, tag = "4")]
    pub domain: String,
    /// Model version
    #[prost(int64, tag = "5")]
    pub model_version: i64,
    /// Free-form description
    #[prost(string, tag = "6")]
    pub doc_string: String,
    /// Computation graph
    #[prost(message, optional, tag = "7")]
    pub graph: Option<GraphProto>,
    /// Operator sets the graph relies on
    #[prost(message, repeated, tag = "8")]
    pub opset_import: Vec<OperatorSetIdProto>,
}

/// Operator set reference.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OperatorSetIdProto {
    /// Empty string is the default `ai.onnx` domain
    #[prost(string, tag = "1")]
    pub domain: String,
    /// Operator set version
    #[prost(int64, tag = "2")]
    pub version: i64,
}

/// Computation graph: topologically sorted nodes plus constant initializers.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GraphProto {
    /// Nodes in evaluation order
    #[prost(message, repeated, tag = "1")]
    pub node: Vec<NodeProto>,
    /// Graph name
    #[prost(string, tag = "2")]
    pub name: String,
    /// Constant tensors referenced by name from node inputs
    #[prost(message, repeated, tag = "5")]
    pub initializer: Vec<TensorProto>,
    /// Free-form description
    #[prost(string, tag = "10")]
    pub doc_string: String,
    /// Graph inputs
    #[prost(message, repeated, tag = "11")]
    pub input: Vec<ValueInfoProto>,
    /// Graph outputs
    #[prost(message, repeated, tag = "12")]
    pub output: Vec<ValueInfoProto>,
    /// Intermediate value annotations
    #[prost(message, repeated, tag = "13")]
    pub value_info: Vec<ValueInfoProto>,
}

/// One operator invocation.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NodeProto {
    /// Input value names
    #[prost(string, repeated, tag = "1")]
    pub input: Vec<String>,
    /// Output value names
    #[prost(string, repeated, tag = "2")]
    pub output: Vec<String>,
    /// Node name
    #[prost(string, tag = "3")]
    pub name: String,
    /// Operator name, e.g. `MatMul`
    #[prost(string, tag = "4")]
    pub op_type: String,
    /// Operator attributes
    #[prost(message, repeated, tag = "5")]
    pub attribute: Vec<AttributeProto>,
    /// Free-form description
    #[prost(string, tag = "6")]
    pub doc_string: String,
    /// Operator domain, empty for `ai.onnx`
    #[prost(string, tag = "7")]
    pub domain: String,
}

impl NodeProto {
    /// Node in the default domain.
    #[must_use]
    pub fn new(op_type: &str, name: &str, inputs: &[&str], outputs: &[&str]) -> Self {
        Self {
            input: inputs.iter().map(ToString::to_string).collect(),
            output: outputs.iter().map(ToString::to_string).collect(),
            name: name.to_string(),
            op_type: op_type.to_string(),
            ..Self::default()
        }
    }

    /// Find an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeProto> {
        self.attribute.iter().find(|a| a.name == name)
    }
}

/// Named operator attribute.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttributeProto {
    /// Attribute name
    #[prost(string, tag = "1")]
    pub name: String,
    /// Float value
    #[prost(float, tag = "2")]
    pub f: f32,
    /// Integer value
    #[prost(int64, tag = "3")]
    pub i: i64,
    /// String value
    #[prost(bytes = "vec", tag = "4")]
    pub s: Vec<u8>,
    /// Float list value
    #[prost(float, repeated, tag = "7")]
    pub floats: Vec<f32>,
    /// Integer list value
    #[prost(int64, repeated, tag = "8")]
    pub ints: Vec<i64>,
    /// One of [`attribute_type`]
    #[prost(int32, tag = "20")]
    pub r#type: i32,
}

impl AttributeProto {
    /// Float attribute.
    #[must_use]
    pub fn float(name: &str, value: f32) -> Self {
        Self {
            name: name.to_string(),
            f: value,
            r#type: attribute_type::FLOAT,
            ..Self::default()
        }
    }

    /// Integer attribute.
    #[must_use]
    pub fn int(name: &str, value: i64) -> Self {
        Self {
            name: name.to_string(),
            i: value,
            r#type: attribute_type::INT,
            ..Self::default()
        }
    }
}

/// Dense tensor, used for initializers.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorProto {
    /// Shape
    #[prost(int64, repeated, tag = "1")]
    pub dims: Vec<i64>,
    /// One of [`data_type`]
    #[prost(int32, tag = "2")]
    pub data_type: i32,
    /// Payload for `FLOAT`
    #[prost(float, repeated, tag = "4")]
    pub float_data: Vec<f32>,
    /// Payload for `INT64`
    #[prost(int64, repeated, tag = "7")]
    pub int64_data: Vec<i64>,
    /// Tensor name, referenced by node inputs
    #[prost(string, tag = "8")]
    pub name: String,
    /// Little-endian packed payload, alternative to the typed fields
    #[prost(bytes = "vec", tag = "9")]
    pub raw_data: Vec<u8>,
    /// Payload for `DOUBLE`
    #[prost(double, repeated, tag = "10")]
    pub double_data: Vec<f64>,
    /// Free-form description
    #[prost(string, tag = "12")]
    pub doc_string: String,
}

impl TensorProto {
    /// `DOUBLE` tensor with the values in `double_data`.
    #[must_use]
    pub fn doubles(name: &str, dims: &[i64], values: Vec<f64>) -> Self {
        Self {
            dims: dims.to_vec(),
            data_type: data_type::DOUBLE,
            name: name.to_string(),
            double_data: values,
            ..Self::default()
        }
    }
}

/// Name and type of a graph input, output or intermediate value.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ValueInfoProto {
    /// Value name
    #[prost(string, tag = "1")]
    pub name: String,
    /// Value type
    #[prost(message, optional, tag = "2")]
    pub r#type: Option<TypeProto>,
    /// Free-form description
    #[prost(string, tag = "3")]
    pub doc_string: String,
}

impl ValueInfoProto {
    /// Tensor value of `elem_type` with the given dimensions.
    #[must_use]
    pub fn tensor(name: &str, elem_type: i32, dims: Vec<tensor_shape_proto::Dimension>) -> Self {
        Self {
            name: name.to_string(),
            r#type: Some(TypeProto {
                value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                    elem_type,
                    shape: Some(TensorShapeProto { dim: dims }),
                })),
                denotation: String::new(),
            }),
            doc_string: String::new(),
        }
    }

    /// Tensor type, if this value is a tensor.
    #[must_use]
    pub fn tensor_type(&self) -> Option<&type_proto::Tensor> {
        match self.r#type.as_ref()?.value.as_ref()? {
            type_proto::Value::TensorType(tensor) => Some(tensor),
        }
    }
}

/// Value type.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TypeProto {
    /// Only tensor types are modelled
    #[prost(oneof = "type_proto::Value", tags = "1")]
    pub value: Option<type_proto::Value>,
    /// Semantic type annotation
    #[prost(string, tag = "6")]
    pub denotation: String,
}

/// Nested types of [`TypeProto`].
pub mod type_proto {
    /// Tensor element type and shape.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Tensor {
        /// One of [`super::data_type`]
        #[prost(int32, tag = "1")]
        pub elem_type: i32,
        /// Shape, absent when unknown
        #[prost(message, optional, tag = "2")]
        pub shape: Option<super::TensorShapeProto>,
    }

    /// Type variants.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        /// Dense tensor
        #[prost(message, tag = "1")]
        TensorType(Tensor),
    }
}

/// Tensor shape made of fixed or symbolic dimensions.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorShapeProto {
    /// Dimensions, outermost first
    #[prost(message, repeated, tag = "1")]
    pub dim: Vec<tensor_shape_proto::Dimension>,
}

/// Nested types of [`TensorShapeProto`].
pub mod tensor_shape_proto {
    /// One dimension.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Dimension {
        /// Fixed size or symbolic name
        #[prost(oneof = "dimension::Value", tags = "1, 2")]
        pub value: Option<dimension::Value>,
        /// Semantic dimension annotation
        #[prost(string, tag = "3")]
        pub denotation: String,
    }

    impl Dimension {
        /// Dimension of fixed size.
        #[must_use]
        pub fn fixed(size: i64) -> Self {
            Self {
                value: Some(dimension::Value::DimValue(size)),
                denotation: String::new(),
            }
        }

        /// Dimension known only by name, e.g. the batch size.
        #[must_use]
        pub fn symbolic(name: &str) -> Self {
            Self {
                value: Some(dimension::Value::DimParam(name.to_string())),
                denotation: String::new(),
            }
        }

        /// Size, if fixed.
        #[must_use]
        pub fn size(&self) -> Option<i64> {
            match self.value {
                Some(dimension::Value::DimValue(size)) => Some(size),
                _ => None,
            }
        }
    }

    /// Nested types of [`Dimension`].
    pub mod dimension {
        /// Dimension variants.
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Value {
            /// Fixed size
            #[prost(int64, tag = "1")]
            DimValue(i64),
            /// Symbolic name
            #[prost(string, tag = "2")]
            DimParam(String),
        }
    }
}
