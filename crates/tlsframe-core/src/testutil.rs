//! Byte-level builders for Hello messages used across the unit tests.

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn push_opaque16(buf: &mut Vec<u8>, data: &[u8]) {
    push_u16(buf, data.len() as u16);
    buf.extend_from_slice(data);
}

pub fn sni_data(host: &str) -> Vec<u8> {
    let mut entry = vec![0x00]; // host_name
    push_opaque16(&mut entry, host.as_bytes());
    let mut data = Vec::new();
    push_opaque16(&mut data, &entry);
    data
}

pub fn alpn_data(protocols: &[&str]) -> Vec<u8> {
    let mut list = Vec::new();
    for p in protocols {
        list.push(p.len() as u8);
        list.extend_from_slice(p.as_bytes());
    }
    let mut data = Vec::new();
    push_opaque16(&mut data, &list);
    data
}

pub fn versions_data(versions: &[u16]) -> Vec<u8> {
    let mut data = vec![(versions.len() * 2) as u8];
    for v in versions {
        push_u16(&mut data, *v);
    }
    data
}

pub fn groups_data(groups: &[u16]) -> Vec<u8> {
    let mut list = Vec::new();
    for g in groups {
        push_u16(&mut list, *g);
    }
    let mut data = Vec::new();
    push_opaque16(&mut data, &list);
    data
}

pub fn point_formats_data(formats: &[u8]) -> Vec<u8> {
    let mut data = vec![formats.len() as u8];
    data.extend_from_slice(formats);
    data
}

/// Concatenate `(type, data)` pairs into TLV form, without the list prefix.
pub fn extension_list(extensions: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let mut list = Vec::new();
    for (ty, data) in extensions {
        push_u16(&mut list, *ty);
        push_opaque16(&mut list, data);
    }
    list
}

#[derive(Debug, Clone)]
pub struct HelloBuilder {
    server: bool,
    record_version: u16,
    version: u16,
    session_id: Vec<u8>,
    cipher_suites: Vec<u16>,
    extensions: Vec<(u16, Vec<u8>)>,
    extension_block: bool,
}

impl HelloBuilder {
    pub fn client() -> Self {
        Self {
            server: false,
            record_version: 0x0301,
            version: 0x0303,
            session_id: vec![0x5A; 32],
            cipher_suites: vec![0x1301, 0xC02F],
            extensions: Vec::new(),
            extension_block: true,
        }
    }

    pub fn server() -> Self {
        Self {
            server: true,
            record_version: 0x0303,
            ..Self::client()
        }
    }

    pub fn record_version(mut self, v: u16) -> Self {
        self.record_version = v;
        self
    }

    pub fn version(mut self, v: u16) -> Self {
        self.version = v;
        self
    }

    pub fn cipher_suites(mut self, suites: &[u16]) -> Self {
        self.cipher_suites = suites.to_vec();
        self
    }

    pub fn extension(mut self, ty: u16, data: Vec<u8>) -> Self {
        self.extensions.push((ty, data));
        self
    }

    pub fn sni(self, host: &str) -> Self {
        self.extension(0x0000, sni_data(host))
    }

    pub fn alpn(self, protocols: &[&str]) -> Self {
        self.extension(0x0010, alpn_data(protocols))
    }

    pub fn supported_versions(self, versions: &[u16]) -> Self {
        self.extension(0x002b, versions_data(versions))
    }

    pub fn supported_groups(self, groups: &[u16]) -> Self {
        self.extension(0x000a, groups_data(groups))
    }

    pub fn ec_point_formats(self, formats: &[u8]) -> Self {
        self.extension(0x000b, point_formats_data(formats))
    }

    pub fn without_extension_block(mut self) -> Self {
        self.extension_block = false;
        self
    }

    /// Hello body, after the handshake header.
    pub fn body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        push_u16(&mut body, self.version);
        body.extend_from_slice(&[0x42; 32]);
        body.push(self.session_id.len() as u8);
        body.extend_from_slice(&self.session_id);
        if self.server {
            push_u16(&mut body, self.cipher_suites.first().copied().unwrap_or(0x1301));
            body.push(0x00);
        } else {
            push_u16(&mut body, (self.cipher_suites.len() * 2) as u16);
            for s in &self.cipher_suites {
                push_u16(&mut body, *s);
            }
            body.extend_from_slice(&[0x01, 0x00]); // null compression only
        }
        if self.extension_block {
            push_opaque16(&mut body, &extension_list(&self.extensions));
        }
        body
    }

    /// Handshake message: type, 24-bit length, body.
    pub fn handshake(&self) -> Vec<u8> {
        let body = self.body();
        let mut msg = vec![if self.server { 0x02 } else { 0x01 }];
        msg.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        msg.extend_from_slice(&body);
        msg
    }

    /// Complete TLS record carrying the handshake message.
    pub fn build(&self) -> Vec<u8> {
        let msg = self.handshake();
        let mut record = vec![0x16];
        push_u16(&mut record, self.record_version);
        push_opaque16(&mut record, &msg);
        record
    }
}
