use nom::bytes::complete::take;

/// Fixed-width, NUL-padded text field in an image tag.
///
/// Decoding keeps the raw bytes exactly as found, including anything after
/// the first NUL, so a decoded tag re-encodes byte-identical.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Signature<const LEN: usize>([u8; LEN]);

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SignatureError {
    TooLong { max: usize },
}

impl std::error::Error for SignatureError {}

impl std::fmt::Display for SignatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SignatureError::TooLong { max } => {
                write!(f, "signature must be less than {} bytes, including NUL", max)
            }
        }
    }
}

impl<const LEN: usize> Signature<LEN> {
    pub const fn new_empty() -> Self {
        Self([0; LEN])
    }

    pub const fn new(data: [u8; LEN]) -> Self {
        Self(data)
    }

    pub fn from_str(s: &str) -> Result<Self, SignatureError> {
        Self::from_bytes(s.as_bytes())
    }

    pub const fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        // use >= to force space for a terminating 0
        if bytes.len() >= LEN {
            return Err(SignatureError::TooLong { max: LEN });
        }

        let mut data = [0; LEN];
        let mut i = 0;
        while i < bytes.len() && bytes[i] > 0 {
            data[i] = bytes[i];
            i += 1;
        }

        Ok(Self(data))
    }

    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        let mut zero = 0;
        while zero < self.0.len() && self.0[zero] > 0 {
            zero += 1;
        }
        std::str::from_utf8(&self.0[..zero])
    }

    pub const fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub(crate) fn parse(input: &[u8]) -> nom::IResult<&[u8], Self> {
        let (input, raw) = take(LEN)(input)?;
        let mut data = [0; LEN];
        data.copy_from_slice(raw);
        Ok((input, Self(data)))
    }
}

impl<const LEN: usize> Default for Signature<LEN> {
    fn default() -> Self {
        Self::new_empty()
    }
}

impl<const LEN: usize> std::fmt::Debug for Signature<LEN> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self.as_str() {
            Ok(s) => f.debug_tuple("Signature").field(&s).finish(),
            Err(_) => f.debug_tuple("Signature").field(&self.as_bytes()).finish(),
        }
    }
}

impl<const LEN: usize> std::ops::Deref for Signature<LEN> {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}
