//! Minimal JVM class-file reader.
//!
//! Only what dependency extraction needs is decoded: the constant pool, the
//! class header, field/method descriptors, generic signatures and
//! annotations. Code and other attributes are skipped by length.

use std::collections::BTreeSet;

use thiserror::Error;

use tangle_core::types::QualifiedName;

const MAGIC: u32 = 0xCAFE_BABE;
const ACC_MODULE: u16 = 0x8000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClassFileError {
    #[error("unexpected end of data at offset {0}")]
    Truncated(usize),

    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),

    #[error("unknown constant pool tag {tag} at entry {index}")]
    UnknownTag { index: usize, tag: u8 },

    #[error("constant pool index {0} does not name a {1}")]
    BadReference(u16, &'static str),
}

/// What one class file declares and references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub name: QualifiedName,
    pub is_module: bool,
    pub dependencies: BTreeSet<QualifiedName>,
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class(u16),
    NameAndType { descriptor: u16 },
    MethodType(u16),
    Other,
    /// Second slot of a long or double.
    Unusable,
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], ClassFileError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ClassFileError::Truncated(self.pos))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ClassFileError> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ClassFileError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ClassFileError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

struct ConstantPool(Vec<Constant>);

impl ConstantPool {
    fn read(reader: &mut Reader<'_>) -> Result<Self, ClassFileError> {
        let count = reader.u16()? as usize;
        // Entry 0 is unused; indices run 1..count.
        let mut entries = vec![Constant::Unusable];
        while entries.len() < count {
            let index = entries.len();
            let tag = reader.u8()?;
            let constant = match tag {
                1 => {
                    let len = reader.u16()? as usize;
                    // Modified UTF-8 differs only for NUL and supplementary
                    // characters, neither of which appears in type names.
                    Constant::Utf8(String::from_utf8_lossy(reader.bytes(len)?).into_owned())
                }
                7 => Constant::Class(reader.u16()?),
                12 => {
                    reader.u16()?;
                    Constant::NameAndType {
                        descriptor: reader.u16()?,
                    }
                }
                16 => Constant::MethodType(reader.u16()?),
                3 | 4 => {
                    reader.bytes(4)?;
                    Constant::Other
                }
                5 | 6 => {
                    reader.bytes(8)?;
                    entries.push(Constant::Other);
                    Constant::Unusable
                }
                8 | 19 | 20 => {
                    reader.bytes(2)?;
                    Constant::Other
                }
                9 | 10 | 11 | 17 | 18 => {
                    reader.bytes(4)?;
                    Constant::Other
                }
                15 => {
                    reader.bytes(3)?;
                    Constant::Other
                }
                _ => return Err(ClassFileError::UnknownTag { index, tag }),
            };
            entries.push(constant);
        }
        Ok(Self(entries))
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.0.get(index as usize) {
            Some(Constant::Utf8(text)) => Ok(text),
            _ => Err(ClassFileError::BadReference(index, "utf8 entry")),
        }
    }

    fn class_name(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.0.get(index as usize) {
            Some(Constant::Class(name)) => self.utf8(*name),
            _ => Err(ClassFileError::BadReference(index, "class entry")),
        }
    }
}

/// Parse a class file and collect every class it references.
pub fn parse(data: &[u8]) -> Result<ClassFile, ClassFileError> {
    let mut reader = Reader::new(data);
    let magic = reader.u32()?;
    if magic != MAGIC {
        return Err(ClassFileError::BadMagic(magic));
    }
    reader.u16()?; // minor
    reader.u16()?; // major

    let pool = ConstantPool::read(&mut reader)?;
    let access = reader.u16()?;
    let this_class = reader.u16()?;
    let name = QualifiedName::new(internal_to_qualified(pool.class_name(this_class)?));

    let mut dependencies = BTreeSet::new();
    for constant in &pool.0 {
        match constant {
            Constant::Class(index) => {
                let internal = pool.utf8(*index)?;
                if internal.starts_with('[') {
                    collect_descriptor(internal, &mut dependencies);
                } else {
                    dependencies.insert(QualifiedName::new(internal_to_qualified(internal)));
                }
            }
            Constant::NameAndType { descriptor } | Constant::MethodType(descriptor) => {
                collect_descriptor(pool.utf8(*descriptor)?, &mut dependencies);
            }
            _ => {}
        }
    }

    reader.u16()?; // super_class is already a class constant
    let interfaces = reader.u16()?;
    reader.bytes(interfaces as usize * 2)?;

    // Fields, then methods: access, name, descriptor, attributes.
    for _ in 0..2 {
        let members = reader.u16()?;
        for _ in 0..members {
            reader.u16()?;
            reader.u16()?;
            let descriptor = reader.u16()?;
            collect_descriptor(pool.utf8(descriptor)?, &mut dependencies);
            read_attributes(&mut reader, &pool, &mut dependencies)?;
        }
    }
    read_attributes(&mut reader, &pool, &mut dependencies)?;

    dependencies.remove(&name);
    Ok(ClassFile {
        name,
        is_module: access & ACC_MODULE != 0,
        dependencies,
    })
}

/// Read an attribute table, collecting types named by signatures and
/// annotations.
fn read_attributes(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
    out: &mut BTreeSet<QualifiedName>,
) -> Result<(), ClassFileError> {
    let count = reader.u16()?;
    for _ in 0..count {
        let name = pool.utf8(reader.u16()?)?;
        let len = reader.u32()? as usize;
        let mut body = Reader::new(reader.bytes(len)?);
        match name {
            "Signature" => collect_signature(pool.utf8(body.u16()?)?, out),
            "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                read_annotations(&mut body, pool, out)?;
            }
            "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations" => {
                let parameters = body.u8()?;
                for _ in 0..parameters {
                    read_annotations(&mut body, pool, out)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Element {
    Annotation,
    Pair,
    Value,
}

/// Annotation types plus the enum and class types used as element values.
fn read_annotations(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
    out: &mut BTreeSet<QualifiedName>,
) -> Result<(), ClassFileError> {
    let count = reader.u16()? as usize;
    let mut pending = vec![Element::Annotation; count];

    while let Some(element) = pending.pop() {
        match element {
            Element::Annotation => {
                collect_descriptor(pool.utf8(reader.u16()?)?, out);
                let pairs = reader.u16()? as usize;
                pending.extend(std::iter::repeat(Element::Pair).take(pairs));
            }
            Element::Pair => {
                reader.u16()?; // element name
                pending.push(Element::Value);
            }
            Element::Value => match reader.u8()? {
                b'e' => {
                    collect_descriptor(pool.utf8(reader.u16()?)?, out);
                    reader.u16()?;
                }
                b'c' => collect_descriptor(pool.utf8(reader.u16()?)?, out),
                b'@' => pending.push(Element::Annotation),
                b'[' => {
                    let values = reader.u16()? as usize;
                    pending.extend(std::iter::repeat(Element::Value).take(values));
                }
                _ => {
                    reader.u16()?;
                }
            },
        }
    }
    Ok(())
}

/// "com/example/Outer$Inner" -> "com.example.Outer$Inner"
fn internal_to_qualified(internal: &str) -> String {
    internal.replace('/', ".")
}

/// Collect every object type named in a field or method descriptor.
fn collect_descriptor(descriptor: &str, out: &mut BTreeSet<QualifiedName>) {
    let mut rest = descriptor;
    while let Some(start) = rest.find('L') {
        let after = &rest[start + 1..];
        match after.find(';') {
            Some(end) => {
                out.insert(QualifiedName::new(internal_to_qualified(&after[..end])));
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
}

/// Collect every class named in a generic signature, type arguments
/// included: "<T:Lapp/Key;>Ljava/util/List<Lapp/Item;>;" names app.Key,
/// java.util.List and app.Item.
fn collect_signature(signature: &str, out: &mut BTreeSet<QualifiedName>) {
    let bytes = signature.as_bytes();
    let find = |from: usize, stop: &dyn Fn(u8) -> bool| {
        bytes[from..]
            .iter()
            .position(|b| stop(*b))
            .map_or(bytes.len(), |i| from + i)
    };
    let name_end = |from: usize| find(from, &|b| matches!(b, b';' | b'<' | b'.'));
    let parameter_end = |from: usize| find(from, &|b| b == b':');

    // Formal type parameter names appear only in a leading "<...>" section.
    let mut in_parameters = bytes.first() == Some(&b'<');
    let mut pos = if in_parameters { parameter_end(1) } else { 0 };
    let mut current = String::new();
    let mut enclosing: Vec<String> = Vec::new();

    while pos < bytes.len() {
        match bytes[pos] {
            b'L' => {
                let end = name_end(pos + 1);
                current = signature[pos + 1..end].to_string();
                out.insert(QualifiedName::new(internal_to_qualified(&current)));
                pos = end;
            }
            b'.' => {
                let end = name_end(pos + 1);
                current = format!("{current}${}", &signature[pos + 1..end]);
                out.insert(QualifiedName::new(internal_to_qualified(&current)));
                pos = end;
            }
            // Type variable reference, "TT;"
            b'T' => pos = find(pos, &|b| b == b';'),
            b'<' => {
                enclosing.push(std::mem::take(&mut current));
                pos += 1;
            }
            b'>' => {
                match enclosing.pop() {
                    Some(outer) => current = outer,
                    None => in_parameters = false,
                }
                pos += 1;
            }
            b';' => {
                pos += 1;
                if in_parameters
                    && enclosing.is_empty()
                    && pos < bytes.len()
                    && !matches!(bytes[pos], b':' | b'>')
                {
                    pos = parameter_end(pos);
                }
            }
            _ => pos += 1,
        }
    }
}
